//! Carts service errors.

use sqlx::{
    Error,
    error::{DatabaseError, ErrorKind},
};
use thiserror::Error;

use crate::domain::catalog::{CatalogServiceError, records::AddonUuid};

#[derive(Debug, Error)]
pub enum CartsServiceError {
    #[error("cart line already exists")]
    AlreadyExists,

    #[error("cart line not found")]
    NotFound,

    #[error("related resource not found")]
    InvalidReference,

    #[error("missing required data")]
    MissingRequiredData,

    #[error("invalid data")]
    InvalidData,

    #[error("quantity must be greater than zero")]
    InvalidQuantity,

    #[error("addon {0} is not available for this product")]
    AddonUnavailable(AddonUuid),

    #[error("addon {addon} quantity {quantity} is outside 1..={max}")]
    AddonQuantity {
        addon: AddonUuid,
        quantity: u32,
        max: u32,
    },

    #[error("addon {0} is listed more than once")]
    DuplicateAddon(AddonUuid),

    #[error(transparent)]
    Catalog(CatalogServiceError),

    #[error("storage error")]
    Sql(#[source] Error),
}

impl From<CatalogServiceError> for CartsServiceError {
    fn from(error: CatalogServiceError) -> Self {
        match error {
            CatalogServiceError::AddonNotFound { addon, .. } => Self::AddonUnavailable(addon),
            CatalogServiceError::Sql(error) => Self::from(error),
            other => Self::Catalog(other),
        }
    }
}

impl From<Error> for CartsServiceError {
    fn from(error: Error) -> Self {
        if matches!(error, Error::RowNotFound) {
            return Self::NotFound;
        }

        match error.as_database_error().map(DatabaseError::kind) {
            Some(ErrorKind::UniqueViolation) => Self::AlreadyExists,
            Some(ErrorKind::ForeignKeyViolation) => Self::InvalidReference,
            Some(ErrorKind::NotNullViolation) => Self::MissingRequiredData,
            Some(ErrorKind::CheckViolation) => Self::InvalidData,
            Some(ErrorKind::Other | _) | None => Self::Sql(error),
        }
    }
}
