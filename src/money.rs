//! Money
//!
//! Amounts are carried as `u64` minor units (pence/cents) everywhere in the crate.
//! Conversion to and from display decimals only happens through this module.

use std::str::FromStr;

use decimal_percentage::Percentage;
use rust_decimal::{
    Decimal, RoundingStrategy,
    prelude::{FromPrimitive, ToPrimitive},
};
use rusty_money::{
    Money, MoneyError,
    iso::{self, Currency},
};
use thiserror::Error;

/// Errors raised while converting between minor units and display amounts.
#[derive(Debug, Error)]
pub enum AmountError {
    /// The ISO currency code is not known.
    #[error("unknown currency code: {0}")]
    UnknownCurrency(String),

    /// The display amount could not be parsed.
    #[error(transparent)]
    Money(#[from] MoneyError),

    /// Negative amounts are never valid prices.
    #[error("amount must not be negative")]
    Negative,

    /// The amount does not fit in the signed range used for display.
    #[error("amount is out of range")]
    OutOfRange,

    /// A percentage string could not be parsed or is outside `0%..=100%`.
    #[error("invalid percentage: {0}")]
    InvalidPercentage(String),

    /// Percentage calculation could not be safely converted.
    #[error("percentage conversion overflowed or was not finite")]
    PercentConversion,
}

/// Look up an ISO currency by its code (e.g. `"USD"`).
///
/// # Errors
///
/// Returns [`AmountError::UnknownCurrency`] when the code is not an ISO 4217 currency.
pub fn currency(code: &str) -> Result<&'static Currency, AmountError> {
    iso::find(code).ok_or_else(|| AmountError::UnknownCurrency(code.to_string()))
}

/// Parse a display amount such as `"10.00"` into minor units.
///
/// # Errors
///
/// Returns an error if the amount cannot be parsed or is negative.
pub fn parse_minor(amount: &str, currency: &'static Currency) -> Result<u64, AmountError> {
    let minor = Money::from_str(amount, currency)?.to_minor_units();

    u64::try_from(minor).ok().ok_or(AmountError::Negative)
}

/// Format minor units for display in the given currency.
///
/// # Errors
///
/// Returns [`AmountError::OutOfRange`] if the amount exceeds `i64::MAX`.
pub fn format_minor(amount: u64, currency: &'static Currency) -> Result<String, AmountError> {
    let minor = i64::try_from(amount).ok().ok_or(AmountError::OutOfRange)?;

    Ok(Money::from_minor(minor, currency).to_string())
}

/// Parse a rate written either as a percentage (`"10%"`) or as a fraction (`"0.10"`).
///
/// # Errors
///
/// Returns [`AmountError::InvalidPercentage`] if the value cannot be parsed or lies outside
/// `0%..=100%`.
pub fn parse_percentage(value: &str) -> Result<Percentage, AmountError> {
    let invalid = || AmountError::InvalidPercentage(value.to_string());
    let trimmed = value.trim();

    let fraction = match trimmed.strip_suffix('%') {
        Some(points) => Decimal::from_str(points.trim())
            .map_err(|_err| invalid())?
            .checked_div(Decimal::ONE_HUNDRED)
            .ok_or_else(invalid)?,
        None => Decimal::from_str(trimmed).map_err(|_err| invalid())?,
    };

    if fraction.is_sign_negative() || fraction > Decimal::ONE {
        return Err(invalid());
    }

    Ok(Percentage::from(fraction))
}

/// Calculate `percent` of a minor unit amount, rounding half away from zero.
///
/// # Errors
///
/// Returns [`AmountError::PercentConversion`] if the calculation overflows.
pub fn percent_of_minor(percent: &Percentage, minor: u64) -> Result<u64, AmountError> {
    let minor = Decimal::from_u64(minor).ok_or(AmountError::PercentConversion)?;

    ((*percent) * Decimal::ONE) // decimal_percentage does not expose the inner Decimal
        .checked_mul(minor)
        .ok_or(AmountError::PercentConversion)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_u64()
        .ok_or(AmountError::PercentConversion)
}
