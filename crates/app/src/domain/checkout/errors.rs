//! Checkout errors.

use std::time::Duration;

use sqlx::error::{DatabaseError, ErrorKind};
use thiserror::Error;

use crate::{
    database,
    domain::{
        carts::records::CartLineUuid,
        catalog::records::{AddonUuid, ProductUuid, VariantUuid},
    },
    retry::IsTransient,
};

/// Storage-side failures. The cart is left untouched and the caller may try again.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("cart lines changed during checkout")]
    Conflict,

    #[error("checkout did not finish within {0:?}")]
    Timeout(Duration),

    #[error("no unique order number after {attempts} attempts")]
    OrderNumberCollision { attempts: u32 },

    #[error("storage error")]
    Sql(#[source] sqlx::Error),
}

#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("no cart lines are selected")]
    EmptySelection,

    #[error("product {product} on cart line {line} is no longer available")]
    ProductNotFound {
        line: CartLineUuid,
        product: ProductUuid,
    },

    #[error("variant {variant} on cart line {line} is no longer available")]
    VariantNotFound {
        line: CartLineUuid,
        variant: VariantUuid,
    },

    #[error("addon {addon} on cart line {line} has no price")]
    AddonPricingUnavailable {
        line: CartLineUuid,
        addon: AddonUuid,
    },

    #[error("price of cart line {line} changed from {cart_price} to {current_price}")]
    PriceChanged {
        line: CartLineUuid,
        cart_price: u64,
        current_price: u64,
    },

    #[error("invalid checkout request: {0}")]
    InvalidRequest(String),

    #[error("integrity violation: {0}")]
    IntegrityViolation(String),

    #[error(transparent)]
    PersistenceFailure(#[from] PersistenceError),
}

impl From<sqlx::Error> for CheckoutError {
    fn from(error: sqlx::Error) -> Self {
        match error.as_database_error().map(DatabaseError::kind) {
            Some(ErrorKind::CheckViolation | ErrorKind::NotNullViolation) => {
                Self::IntegrityViolation(error.to_string())
            }
            _ => Self::PersistenceFailure(PersistenceError::Sql(error)),
        }
    }
}

impl IsTransient for CheckoutError {
    fn is_transient(&self) -> bool {
        match self {
            Self::PersistenceFailure(PersistenceError::Conflict) => true,
            Self::PersistenceFailure(PersistenceError::Sql(error)) => database::is_transient(error),
            _ => false,
        }
    }
}
