//! Order lifecycle rules: payment settlement, cancellation and the
//! administrative status override.

mod actions;
pub mod entity;
pub mod error;

pub use actions::*;
pub use error::*;
