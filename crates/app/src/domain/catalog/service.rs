//! Catalog reader.

use async_trait::async_trait;
use mockall::automock;

use crate::{
    database::Db,
    domain::catalog::{
        CatalogServiceError, PgCatalogRepository, quote_addon, quote_price,
        records::{
            AddonRecord, AddonUuid, PriceQuote, ProductRecord, ProductUuid, VariantRecord,
            VariantUuid,
        },
    },
};

#[derive(Debug, Clone)]
pub struct PgCatalogReader {
    db: Db,
    repository: PgCatalogRepository,
}

impl PgCatalogReader {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            repository: PgCatalogRepository::new(),
        }
    }
}

#[async_trait]
impl CatalogReader for PgCatalogReader {
    async fn get_product(&self, product: ProductUuid) -> Result<ProductRecord, CatalogServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let record = self
            .repository
            .get_product(&mut tx, product)
            .await?
            .ok_or(CatalogServiceError::ProductNotFound(product))?;

        tx.commit().await?;

        Ok(record)
    }

    async fn get_variant(
        &self,
        product: ProductUuid,
        variant: VariantUuid,
    ) -> Result<VariantRecord, CatalogServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let record = self
            .repository
            .get_variant(&mut tx, product, variant)
            .await?
            .ok_or(CatalogServiceError::VariantNotFound { product, variant })?;

        tx.commit().await?;

        Ok(record)
    }

    async fn get_addon(
        &self,
        product: ProductUuid,
        addon: AddonUuid,
    ) -> Result<AddonRecord, CatalogServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let record = quote_addon(&self.repository, &mut tx, product, addon).await?;

        tx.commit().await?;

        Ok(record)
    }

    async fn get_price(
        &self,
        product: ProductUuid,
        variant: Option<VariantUuid>,
    ) -> Result<PriceQuote, CatalogServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let quote = quote_price(&self.repository, &mut tx, product, variant).await?;

        tx.commit().await?;

        Ok(quote)
    }
}

#[automock]
#[async_trait]
pub trait CatalogReader: Send + Sync {
    /// Retrieve an active product.
    async fn get_product(&self, product: ProductUuid) -> Result<ProductRecord, CatalogServiceError>;

    /// Retrieve an active variant of `product`.
    async fn get_variant(
        &self,
        product: ProductUuid,
        variant: VariantUuid,
    ) -> Result<VariantRecord, CatalogServiceError>;

    /// Retrieve an active addon mapped to `product`.
    async fn get_addon(
        &self,
        product: ProductUuid,
        addon: AddonUuid,
    ) -> Result<AddonRecord, CatalogServiceError>;

    /// Current unit price: the variant's price when a variant is given, the product's otherwise.
    async fn get_price(
        &self,
        product: ProductUuid,
        variant: Option<VariantUuid>,
    ) -> Result<PriceQuote, CatalogServiceError>;
}
