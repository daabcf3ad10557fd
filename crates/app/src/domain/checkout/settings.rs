//! Checkout settings.

use std::time::Duration;

use crate::retry::RetryConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckoutSettings {
    /// Largest difference, in minor units, tolerated between the cart price and the live
    /// catalog price before checkout refuses with `PriceChanged`.
    pub price_tolerance: u64,

    /// Upper bound on a single checkout attempt, also applied as the statement timeout.
    pub transaction_timeout: Duration,

    /// Retries of the whole unit of work on transient storage failures.
    pub retry: RetryConfig,

    /// Order numbers tried before giving up on a uniqueness collision.
    pub order_number_attempts: u32,
}

impl Default for CheckoutSettings {
    fn default() -> Self {
        Self {
            price_tolerance: 0,
            transaction_timeout: Duration::from_secs(5),
            retry: RetryConfig::default(),
            order_number_attempts: 5,
        }
    }
}
