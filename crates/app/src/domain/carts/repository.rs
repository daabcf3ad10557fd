//! Cart Lines Repository

use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as, types::Json};
use uuid::Uuid;

use crate::{
    database::{amount_from_db, amount_to_db, quantity_from_db, quantity_to_db},
    domain::{
        carts::{
            data::NewCartLine,
            records::{AddonSelection, CartLineRecord, CartLineUuid},
        },
        catalog::records::{ProductUuid, VariantUuid},
    },
    identity::CustomerUuid,
};

const CREATE_CART_LINE_SQL: &str = include_str!("sql/create_cart_line.sql");
const GET_CART_LINE_FOR_UPDATE_SQL: &str = include_str!("sql/get_cart_line_for_update.sql");
const LIST_CART_LINES_SQL: &str = include_str!("sql/list_cart_lines.sql");
const LIST_CART_LINES_FOR_UPDATE_SQL: &str = include_str!("sql/list_cart_lines_for_update.sql");
const LIST_SELECTED_CART_LINES_SQL: &str = include_str!("sql/list_selected_cart_lines.sql");
const LOCK_SELECTED_CART_LINES_SQL: &str = include_str!("sql/lock_selected_cart_lines.sql");
const UPDATE_CART_LINE_SQL: &str = include_str!("sql/update_cart_line.sql");
const UPDATE_CART_LINE_PRICE_SQL: &str = include_str!("sql/update_cart_line_price.sql");
const DELETE_CART_LINE_SQL: &str = include_str!("sql/delete_cart_line.sql");
const DELETE_CART_LINES_SQL: &str = include_str!("sql/delete_cart_lines.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgCartLinesRepository;

impl PgCartLinesRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn create_cart_line(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        customer: CustomerUuid,
        line: &NewCartLine,
        unit_price: u64,
    ) -> Result<CartLineRecord, sqlx::Error> {
        query_as::<Postgres, CartLineRecord>(CREATE_CART_LINE_SQL)
            .bind(line.uuid.into_uuid())
            .bind(customer.into_uuid())
            .bind(line.product_uuid.into_uuid())
            .bind(line.variant_uuid.map(VariantUuid::into_uuid))
            .bind(quantity_to_db(line.quantity, "quantity")?)
            .bind(amount_to_db(unit_price, "unit_price")?)
            .bind(Json(&line.addons))
            .bind(&line.notes)
            .fetch_one(&mut **tx)
            .await
    }

    /// Fetch and row-lock a single line owned by `customer`.
    pub(crate) async fn get_cart_line_for_update(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        customer: CustomerUuid,
        line: CartLineUuid,
    ) -> Result<CartLineRecord, sqlx::Error> {
        query_as::<Postgres, CartLineRecord>(GET_CART_LINE_FOR_UPDATE_SQL)
            .bind(line.into_uuid())
            .bind(customer.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn list_cart_lines(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        customer: CustomerUuid,
    ) -> Result<Vec<CartLineRecord>, sqlx::Error> {
        query_as::<Postgres, CartLineRecord>(LIST_CART_LINES_SQL)
            .bind(customer.into_uuid())
            .fetch_all(&mut **tx)
            .await
    }

    pub(crate) async fn list_cart_lines_for_update(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        customer: CustomerUuid,
    ) -> Result<Vec<CartLineRecord>, sqlx::Error> {
        query_as::<Postgres, CartLineRecord>(LIST_CART_LINES_FOR_UPDATE_SQL)
            .bind(customer.into_uuid())
            .fetch_all(&mut **tx)
            .await
    }

    pub(crate) async fn list_selected_cart_lines(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        customer: CustomerUuid,
    ) -> Result<Vec<CartLineRecord>, sqlx::Error> {
        query_as::<Postgres, CartLineRecord>(LIST_SELECTED_CART_LINES_SQL)
            .bind(customer.into_uuid())
            .fetch_all(&mut **tx)
            .await
    }

    /// Fetch and row-lock every selected line owned by `customer`.
    pub(crate) async fn lock_selected_cart_lines(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        customer: CustomerUuid,
    ) -> Result<Vec<CartLineRecord>, sqlx::Error> {
        query_as::<Postgres, CartLineRecord>(LOCK_SELECTED_CART_LINES_SQL)
            .bind(customer.into_uuid())
            .fetch_all(&mut **tx)
            .await
    }

    pub(crate) async fn update_cart_line(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        line: &CartLineRecord,
    ) -> Result<CartLineRecord, sqlx::Error> {
        query_as::<Postgres, CartLineRecord>(UPDATE_CART_LINE_SQL)
            .bind(line.uuid.into_uuid())
            .bind(line.customer_uuid.into_uuid())
            .bind(quantity_to_db(line.quantity, "quantity")?)
            .bind(Json(&line.addons))
            .bind(&line.notes)
            .bind(line.selected)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn update_cart_line_price(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        customer: CustomerUuid,
        line: CartLineUuid,
        unit_price: u64,
    ) -> Result<CartLineRecord, sqlx::Error> {
        query_as::<Postgres, CartLineRecord>(UPDATE_CART_LINE_PRICE_SQL)
            .bind(line.into_uuid())
            .bind(customer.into_uuid())
            .bind(amount_to_db(unit_price, "unit_price")?)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn delete_cart_line(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        customer: CustomerUuid,
        line: CartLineUuid,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(DELETE_CART_LINE_SQL)
            .bind(line.into_uuid())
            .bind(customer.into_uuid())
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    /// Delete the given lines, returning how many rows went away.
    pub(crate) async fn delete_cart_lines(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        customer: CustomerUuid,
        lines: &[CartLineUuid],
    ) -> Result<u64, sqlx::Error> {
        let uuids: Vec<Uuid> = lines.iter().map(|line| line.into_uuid()).collect();

        let rows_affected = query(DELETE_CART_LINES_SQL)
            .bind(customer.into_uuid())
            .bind(&uuids)
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }
}

impl<'r> FromRow<'r, PgRow> for CartLineRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let Json(addons) = row.try_get::<Json<Vec<AddonSelection>>, _>("addons")?;

        Ok(Self {
            uuid: CartLineUuid::from_uuid(row.try_get::<Uuid, _>("uuid")?),
            customer_uuid: CustomerUuid::from_uuid(row.try_get::<Uuid, _>("customer_uuid")?),
            product_uuid: ProductUuid::from_uuid(row.try_get::<Uuid, _>("product_uuid")?),
            variant_uuid: row
                .try_get::<Option<Uuid>, _>("variant_uuid")?
                .map(VariantUuid::from_uuid),
            quantity: quantity_from_db(row.try_get("quantity")?, "quantity")?,
            unit_price: amount_from_db(row.try_get("unit_price")?, "unit_price")?,
            addons,
            notes: row.try_get("notes")?,
            selected: row.try_get("selected")?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}
