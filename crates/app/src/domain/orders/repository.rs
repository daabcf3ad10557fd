//! Orders Repository

use jiff_sqlx::Timestamp as SqlxTimestamp;
use kasa::{
    orders::{Lifecycle, OrderDraft, OrderLineDraft, OrderStatus, PaymentStatus},
    pricing::AddonSnapshot,
};
use rustc_hash::FxHashMap;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query_as, types::Json};
use uuid::Uuid;

use crate::{
    database::{amount_from_db, amount_to_db, quantity_from_db, quantity_to_db},
    domain::{
        catalog::records::{ProductUuid, VariantUuid},
        orders::records::{OrderLineRecord, OrderLineUuid, OrderRecord, OrderUuid},
    },
    identity::CustomerUuid,
};

const CREATE_ORDER_SQL: &str = include_str!("sql/create_order.sql");
const CREATE_ORDER_LINE_SQL: &str = include_str!("sql/create_order_line.sql");
const GET_ORDER_SQL: &str = include_str!("sql/get_order.sql");
const LIST_ORDERS_SQL: &str = include_str!("sql/list_orders.sql");
const GET_ORDER_LINES_SQL: &str = include_str!("sql/get_order_lines.sql");
const TRANSITION_ORDER_SQL: &str = include_str!("sql/transition_order.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgOrdersRepository;

impl PgOrdersRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    /// Insert an order header and its line snapshots.
    pub(crate) async fn create_order(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        draft: &OrderDraft,
    ) -> Result<OrderRecord, sqlx::Error> {
        let details = draft.details();

        let mut order = query_as::<Postgres, OrderRecord>(CREATE_ORDER_SQL)
            .bind(draft.uuid())
            .bind(draft.order_number())
            .bind(draft.customer())
            .bind(amount_to_db(draft.subtotal(), "subtotal")?)
            .bind(amount_to_db(draft.tax(), "tax")?)
            .bind(amount_to_db(draft.shipping(), "shipping")?)
            .bind(amount_to_db(draft.discount(), "discount")?)
            .bind(amount_to_db(draft.total(), "total")?)
            .bind(&details.shipping_address)
            .bind(&details.billing_address)
            .bind(&details.payment_method)
            .bind(&details.notes)
            .fetch_one(&mut **tx)
            .await?;

        for line in draft.lines() {
            let line = self.create_order_line(tx, order.uuid, line).await?;

            order.lines.push(line);
        }

        Ok(order)
    }

    async fn create_order_line(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
        line: &OrderLineDraft,
    ) -> Result<OrderLineRecord, sqlx::Error> {
        query_as::<Postgres, OrderLineRecord>(CREATE_ORDER_LINE_SQL)
            .bind(Uuid::now_v7())
            .bind(order.into_uuid())
            .bind(quantity_to_db(line.position, "position")?)
            .bind(line.product)
            .bind(line.variant)
            .bind(&line.product_name)
            .bind(&line.variant_name)
            .bind(quantity_to_db(line.quantity, "quantity")?)
            .bind(amount_to_db(line.unit_price, "unit_price")?)
            .bind(Json(&line.addons))
            .bind(amount_to_db(line.line_subtotal, "line_subtotal")?)
            .fetch_one(&mut **tx)
            .await
    }

    /// Fetch an order header. `customer` scopes the lookup when given.
    pub(crate) async fn get_order(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
        customer: Option<CustomerUuid>,
    ) -> Result<OrderRecord, sqlx::Error> {
        let mut record = query_as::<Postgres, OrderRecord>(GET_ORDER_SQL)
            .bind(order.into_uuid())
            .bind(customer.map(CustomerUuid::into_uuid))
            .fetch_one(&mut **tx)
            .await?;

        record.lines = self.get_order_lines(tx, &[order]).await?;

        Ok(record)
    }

    /// Every order of `customer`, newest first, lines included.
    pub(crate) async fn list_orders(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        customer: CustomerUuid,
    ) -> Result<Vec<OrderRecord>, sqlx::Error> {
        let mut orders = query_as::<Postgres, OrderRecord>(LIST_ORDERS_SQL)
            .bind(customer.into_uuid())
            .fetch_all(&mut **tx)
            .await?;

        let uuids: Vec<OrderUuid> = orders.iter().map(|order| order.uuid).collect();

        let mut lines: FxHashMap<OrderUuid, Vec<OrderLineRecord>> = FxHashMap::default();

        for line in self.get_order_lines(tx, &uuids).await? {
            lines.entry(line.order_uuid).or_default().push(line);
        }

        for order in &mut orders {
            order.lines = lines.remove(&order.uuid).unwrap_or_default();
        }

        Ok(orders)
    }

    async fn get_order_lines(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        orders: &[OrderUuid],
    ) -> Result<Vec<OrderLineRecord>, sqlx::Error> {
        let uuids: Vec<Uuid> = orders.iter().map(|order| order.into_uuid()).collect();

        query_as::<Postgres, OrderLineRecord>(GET_ORDER_LINES_SQL)
            .bind(&uuids)
            .fetch_all(&mut **tx)
            .await
    }

    /// Compare-and-set the lifecycle columns.
    ///
    /// Returns `None` when the stored status is no longer `expected`.
    pub(crate) async fn transition_order(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
        expected: OrderStatus,
        lifecycle: Lifecycle,
    ) -> Result<Option<OrderRecord>, sqlx::Error> {
        let record = query_as::<Postgres, OrderRecord>(TRANSITION_ORDER_SQL)
            .bind(order.into_uuid())
            .bind(expected.as_str())
            .bind(lifecycle.status.as_str())
            .bind(lifecycle.payment_status.as_str())
            .bind(lifecycle.paid_at.map(SqlxTimestamp::from))
            .bind(lifecycle.canceled_at.map(SqlxTimestamp::from))
            .bind(lifecycle.completed_at.map(SqlxTimestamp::from))
            .fetch_optional(&mut **tx)
            .await?;

        let Some(mut record) = record else {
            return Ok(None);
        };

        record.lines = self.get_order_lines(tx, &[order]).await?;

        Ok(Some(record))
    }
}

fn decode_error(column: &str, source: impl std::error::Error + Send + Sync + 'static) -> sqlx::Error {
    sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(source),
    }
}

impl<'r> FromRow<'r, PgRow> for OrderRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let status = row
            .try_get::<String, _>("status")?
            .parse::<OrderStatus>()
            .map_err(|e| decode_error("status", e))?;

        let payment_status = row
            .try_get::<String, _>("payment_status")?
            .parse::<PaymentStatus>()
            .map_err(|e| decode_error("payment_status", e))?;

        Ok(Self {
            uuid: OrderUuid::from_uuid(row.try_get::<Uuid, _>("uuid")?),
            order_number: row.try_get("order_number")?,
            customer_uuid: CustomerUuid::from_uuid(row.try_get::<Uuid, _>("customer_uuid")?),
            status,
            payment_status,
            subtotal: amount_from_db(row.try_get("subtotal")?, "subtotal")?,
            tax: amount_from_db(row.try_get("tax")?, "tax")?,
            shipping: amount_from_db(row.try_get("shipping")?, "shipping")?,
            discount: amount_from_db(row.try_get("discount")?, "discount")?,
            total: amount_from_db(row.try_get("total")?, "total")?,
            shipping_address: row.try_get("shipping_address")?,
            billing_address: row.try_get("billing_address")?,
            payment_method: row.try_get("payment_method")?,
            notes: row.try_get("notes")?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
            paid_at: row
                .try_get::<Option<SqlxTimestamp>, _>("paid_at")?
                .map(SqlxTimestamp::to_jiff),
            canceled_at: row
                .try_get::<Option<SqlxTimestamp>, _>("canceled_at")?
                .map(SqlxTimestamp::to_jiff),
            completed_at: row
                .try_get::<Option<SqlxTimestamp>, _>("completed_at")?
                .map(SqlxTimestamp::to_jiff),
            lines: Vec::new(),
        })
    }
}

impl<'r> FromRow<'r, PgRow> for OrderLineRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let Json(addons) = row.try_get::<Json<Vec<AddonSnapshot>>, _>("addons")?;

        Ok(Self {
            uuid: OrderLineUuid::from_uuid(row.try_get::<Uuid, _>("uuid")?),
            order_uuid: OrderUuid::from_uuid(row.try_get::<Uuid, _>("order_uuid")?),
            position: quantity_from_db(row.try_get("position")?, "position")?,
            product_uuid: ProductUuid::from_uuid(row.try_get::<Uuid, _>("product_uuid")?),
            variant_uuid: row
                .try_get::<Option<Uuid>, _>("variant_uuid")?
                .map(VariantUuid::from_uuid),
            product_name: row.try_get("product_name")?,
            variant_name: row.try_get("variant_name")?,
            quantity: quantity_from_db(row.try_get("quantity")?, "quantity")?,
            unit_price: amount_from_db(row.try_get("unit_price")?, "unit_price")?,
            addons,
            line_subtotal: amount_from_db(row.try_get("line_subtotal")?, "line_subtotal")?,
        })
    }
}
