//! Checkout
//!
//! Turns a customer's selected cart lines into an order in one unit of work: lock the lines,
//! re-check prices, price, assemble, insert, clear the consumed lines, commit.

pub mod errors;
pub mod service;
pub mod settings;

pub use errors::{CheckoutError, PersistenceError};
pub use service::*;
pub use settings::CheckoutSettings;
