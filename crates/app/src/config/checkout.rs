//! Checkout Config

use std::time::Duration;

use clap::Args;
use kasa::{
    money::{currency, parse_minor, parse_percentage},
    pricing::{FlatShipping, FreeShippingOver, PercentageTax, PricingEngine},
};
use rusty_money::iso::Currency;

use crate::{config::ConfigError, domain::checkout::CheckoutSettings, retry::RetryConfig};

/// Pricing and checkout settings.
#[derive(Debug, Clone, Args)]
pub struct CheckoutConfig {
    /// ISO 4217 currency that amounts are entered and shown in
    #[arg(long, env = "KASA_CURRENCY", default_value = "USD")]
    pub currency: String,

    /// Tax rate applied to the order subtotal, e.g. "10%" or "0.10"
    #[arg(long, env = "KASA_TAX_RATE", default_value = "10%")]
    pub tax_rate: String,

    /// Flat shipping fee, e.g. "10.00"
    #[arg(long, env = "KASA_SHIPPING_FEE", default_value = "10.00")]
    pub shipping_fee: String,

    /// Subtotal at or above which shipping is free
    #[arg(long, env = "KASA_FREE_SHIPPING_THRESHOLD")]
    pub free_shipping_threshold: Option<String>,

    /// Largest accepted drift between cart and catalog price, e.g. "0.00"
    #[arg(long, env = "KASA_PRICE_TOLERANCE", default_value = "0.00")]
    pub price_tolerance: String,

    /// Upper bound on a single checkout attempt in milliseconds
    #[arg(long, env = "KASA_TRANSACTION_TIMEOUT_MS", default_value_t = 5_000)]
    pub transaction_timeout_ms: u64,

    /// Attempts of the whole checkout on transient storage failures
    #[arg(long, env = "KASA_CHECKOUT_ATTEMPTS", default_value_t = 3)]
    pub checkout_attempts: u32,

    /// Order numbers tried before giving up on collisions
    #[arg(long, env = "KASA_ORDER_NUMBER_ATTEMPTS", default_value_t = 5)]
    pub order_number_attempts: u32,

    /// Delay before the first checkout retry in milliseconds
    #[arg(long, env = "KASA_RETRY_BACKOFF_MS", default_value_t = 50)]
    pub retry_backoff_ms: u64,
}

impl CheckoutConfig {
    /// The configured display currency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Currency`] for an unknown ISO code.
    pub fn currency(&self) -> Result<&'static Currency, ConfigError> {
        currency(&self.currency).map_err(ConfigError::Currency)
    }

    /// Build the pricing engine from the tax and shipping settings.
    ///
    /// # Errors
    ///
    /// Returns an error when a rate or amount cannot be parsed.
    pub fn pricing_engine(&self) -> Result<PricingEngine, ConfigError> {
        let currency = self.currency()?;

        let tax = PercentageTax::new(parse_percentage(&self.tax_rate).map_err(ConfigError::TaxRate)?);
        let fee = parse_minor(&self.shipping_fee, currency).map_err(ConfigError::ShippingFee)?;

        let Some(threshold) = &self.free_shipping_threshold else {
            return Ok(PricingEngine::new(tax, FlatShipping::new(fee)));
        };

        let threshold =
            parse_minor(threshold, currency).map_err(ConfigError::FreeShippingThreshold)?;

        Ok(PricingEngine::new(tax, FreeShippingOver::new(threshold, fee)))
    }

    /// Build the checkout settings.
    ///
    /// # Errors
    ///
    /// Returns an error when the tolerance cannot be parsed or an attempt count is zero.
    pub fn settings(&self) -> Result<CheckoutSettings, ConfigError> {
        if self.checkout_attempts == 0 {
            return Err(ConfigError::ZeroAttempts("KASA_CHECKOUT_ATTEMPTS"));
        }

        if self.order_number_attempts == 0 {
            return Err(ConfigError::ZeroAttempts("KASA_ORDER_NUMBER_ATTEMPTS"));
        }

        let price_tolerance = parse_minor(&self.price_tolerance, self.currency()?)
            .map_err(ConfigError::PriceTolerance)?;

        let defaults = RetryConfig::default();

        Ok(CheckoutSettings {
            price_tolerance,
            transaction_timeout: Duration::from_millis(self.transaction_timeout_ms),
            retry: RetryConfig {
                max_attempts: self.checkout_attempts,
                initial_delay: Duration::from_millis(self.retry_backoff_ms),
                ..defaults
            },
            order_number_attempts: self.order_number_attempts,
        })
    }
}
