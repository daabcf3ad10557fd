//! Catalog Repository

use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query_as};
use uuid::Uuid;

use crate::{
    database::{amount_from_db, quantity_from_db},
    domain::catalog::records::{
        AddonRecord, AddonUuid, ProductRecord, ProductUuid, VariantRecord, VariantUuid,
    },
};

const GET_PRODUCT_SQL: &str = include_str!("sql/get_product.sql");
const GET_VARIANT_SQL: &str = include_str!("sql/get_variant.sql");
const GET_ADDON_SQL: &str = include_str!("sql/get_addon.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgCatalogRepository;

impl PgCatalogRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn get_product(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product: ProductUuid,
    ) -> Result<Option<ProductRecord>, sqlx::Error> {
        query_as::<Postgres, ProductRecord>(GET_PRODUCT_SQL)
            .bind(product.into_uuid())
            .fetch_optional(&mut **tx)
            .await
    }

    pub(crate) async fn get_variant(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product: ProductUuid,
        variant: VariantUuid,
    ) -> Result<Option<VariantRecord>, sqlx::Error> {
        query_as::<Postgres, VariantRecord>(GET_VARIANT_SQL)
            .bind(variant.into_uuid())
            .bind(product.into_uuid())
            .fetch_optional(&mut **tx)
            .await
    }

    pub(crate) async fn get_addon(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product: ProductUuid,
        addon: AddonUuid,
    ) -> Result<Option<AddonRecord>, sqlx::Error> {
        query_as::<Postgres, AddonRecord>(GET_ADDON_SQL)
            .bind(product.into_uuid())
            .bind(addon.into_uuid())
            .fetch_optional(&mut **tx)
            .await
    }
}

impl<'r> FromRow<'r, PgRow> for ProductRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: ProductUuid::from_uuid(row.try_get::<Uuid, _>("uuid")?),
            name: row.try_get("name")?,
            price: amount_from_db(row.try_get("price")?, "price")?,
        })
    }
}

impl<'r> FromRow<'r, PgRow> for VariantRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: VariantUuid::from_uuid(row.try_get::<Uuid, _>("uuid")?),
            product_uuid: ProductUuid::from_uuid(row.try_get::<Uuid, _>("product_uuid")?),
            name: row.try_get("name")?,
            price: amount_from_db(row.try_get("price")?, "price")?,
        })
    }
}

impl<'r> FromRow<'r, PgRow> for AddonRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: AddonUuid::from_uuid(row.try_get::<Uuid, _>("uuid")?),
            name: row.try_get("name")?,
            price: amount_from_db(row.try_get("price")?, "price")?,
            max_quantity: quantity_from_db(row.try_get("max_quantity")?, "max_quantity")?,
        })
    }
}
