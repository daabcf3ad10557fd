//! Orders

pub mod errors;
pub mod numbers;
pub mod records;
mod repository;
pub mod service;

pub use errors::OrdersServiceError;
pub use numbers::{OrderNumberGenerator, TimestampOrderNumbers};
pub(crate) use repository::PgOrdersRepository;
pub use service::*;
