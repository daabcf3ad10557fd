//! Order Records

use jiff::Timestamp;
use kasa::{
    orders::{Lifecycle, OrderStatus, PaymentStatus},
    pricing::AddonSnapshot,
};

use crate::{
    domain::catalog::records::{ProductUuid, VariantUuid},
    identity::CustomerUuid,
    uuids::TypedUuid,
};

/// Order UUID
pub type OrderUuid = TypedUuid<OrderRecord>;

/// Order Line UUID
pub type OrderLineUuid = TypedUuid<OrderLineRecord>;

/// Order Record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRecord {
    pub uuid: OrderUuid,
    pub order_number: String,
    pub customer_uuid: CustomerUuid,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub subtotal: u64,
    pub tax: u64,
    pub shipping: u64,
    pub discount: u64,
    pub total: u64,
    pub shipping_address: String,
    pub billing_address: String,
    pub payment_method: String,
    pub notes: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub paid_at: Option<Timestamp>,
    pub canceled_at: Option<Timestamp>,
    pub completed_at: Option<Timestamp>,
    pub lines: Vec<OrderLineRecord>,
}

impl OrderRecord {
    #[must_use]
    pub fn lifecycle(&self) -> Lifecycle {
        Lifecycle {
            status: self.status,
            payment_status: self.payment_status,
            paid_at: self.paid_at,
            canceled_at: self.canceled_at,
            completed_at: self.completed_at,
        }
    }
}

/// Order Line Record
///
/// A snapshot taken at checkout. Catalog ids are kept for reference only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderLineRecord {
    pub uuid: OrderLineUuid,
    pub order_uuid: OrderUuid,
    pub position: u32,
    pub product_uuid: ProductUuid,
    pub variant_uuid: Option<VariantUuid>,
    pub product_name: String,
    pub variant_name: Option<String>,
    pub quantity: u32,
    pub unit_price: u64,
    pub addons: Vec<AddonSnapshot>,
    pub line_subtotal: u64,
}
