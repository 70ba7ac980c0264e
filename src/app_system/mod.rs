//! Runtime orchestration and lifecycle management.
//!
//! - [`OrderSystem`] starts the order store actor and shuts it down.
//! - [`AppConfig`] layers defaults, an optional config file and `LILIAN_*`
//!   environment variables.
//! - [`setup_tracing`] initializes logging.

pub mod config;
pub mod order_system;
pub mod tracing;

pub use self::config::*;
pub use self::order_system::*;
pub use self::tracing::*;
