//! Order store for the Dear Lilian soap shop.
//!
//! Orders live in a single-writer actor that persists the whole collection to
//! one durable slot after every change. Callers hold an [`OrderClient`].

pub mod actor_framework;
pub mod app_system;
pub mod clients;
pub mod domain;
pub mod order_actor;
pub mod storage;

#[cfg(test)]
mod mock_framework;

pub use app_system::{setup_tracing, AppConfig, OrderSystem};
pub use clients::OrderClient;
pub use domain::{Cart, LineItem, Order, OrderCreate, OrderStats, OrderStatus, PaymentMethod, Product};
pub use order_actor::{OrderError, PaymentOutcome, PaymentRequest, StatusOverride};
