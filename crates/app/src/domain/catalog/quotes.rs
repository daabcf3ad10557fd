//! Price resolution inside a caller-supplied transaction.

use sqlx::{Postgres, Transaction};

use crate::domain::catalog::{
    CatalogServiceError, PgCatalogRepository,
    records::{AddonRecord, AddonUuid, PriceQuote, ProductUuid, VariantUuid},
};

/// Current unit price of `product`, or of `variant` when one is given.
pub(crate) async fn quote_price(
    repository: &PgCatalogRepository,
    tx: &mut Transaction<'_, Postgres>,
    product: ProductUuid,
    variant: Option<VariantUuid>,
) -> Result<PriceQuote, CatalogServiceError> {
    let record = repository
        .get_product(tx, product)
        .await?
        .ok_or(CatalogServiceError::ProductNotFound(product))?;

    let Some(variant) = variant else {
        return Ok(PriceQuote {
            product_uuid: record.uuid,
            variant_uuid: None,
            unit_price: record.price,
            product_name: record.name,
            variant_name: None,
        });
    };

    let variant_record = repository
        .get_variant(tx, product, variant)
        .await?
        .ok_or(CatalogServiceError::VariantNotFound { product, variant })?;

    Ok(PriceQuote {
        product_uuid: record.uuid,
        variant_uuid: Some(variant_record.uuid),
        unit_price: variant_record.price,
        product_name: record.name,
        variant_name: Some(variant_record.name),
    })
}

/// An addon that is active and mapped to `product`.
pub(crate) async fn quote_addon(
    repository: &PgCatalogRepository,
    tx: &mut Transaction<'_, Postgres>,
    product: ProductUuid,
    addon: AddonUuid,
) -> Result<AddonRecord, CatalogServiceError> {
    repository
        .get_addon(tx, product, addon)
        .await?
        .ok_or(CatalogServiceError::AddonNotFound { product, addon })
}
