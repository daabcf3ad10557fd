//! Configuration
//!
//! Everything is read once at start-up from flags, the environment or `.env`, then handed
//! to constructors explicitly.

use kasa::money::AmountError;
use thiserror::Error;

pub mod checkout;
pub mod db;
pub mod logging;

pub use checkout::CheckoutConfig;
pub use db::DatabaseConfig;
pub use logging::{LogFormat, LoggingConfig};

/// Errors raised while turning raw configuration into typed settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("KASA_CURRENCY: {0}")]
    Currency(#[source] AmountError),

    #[error("KASA_TAX_RATE: {0}")]
    TaxRate(#[source] AmountError),

    #[error("KASA_SHIPPING_FEE: {0}")]
    ShippingFee(#[source] AmountError),

    #[error("KASA_FREE_SHIPPING_THRESHOLD: {0}")]
    FreeShippingThreshold(#[source] AmountError),

    #[error("KASA_PRICE_TOLERANCE: {0}")]
    PriceTolerance(#[source] AmountError),

    #[error("{0} must be at least 1")]
    ZeroAttempts(&'static str),
}
