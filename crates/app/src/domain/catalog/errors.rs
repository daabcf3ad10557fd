//! Catalog errors.

use sqlx::Error;
use thiserror::Error;

use crate::domain::catalog::records::{AddonUuid, ProductUuid, VariantUuid};

#[derive(Debug, Error)]
pub enum CatalogServiceError {
    #[error("product {0} not found")]
    ProductNotFound(ProductUuid),

    #[error("variant {variant} not found for product {product}")]
    VariantNotFound {
        product: ProductUuid,
        variant: VariantUuid,
    },

    #[error("addon {addon} not available for product {product}")]
    AddonNotFound {
        product: ProductUuid,
        addon: AddonUuid,
    },

    #[error("storage error")]
    Sql(#[from] Error),
}
