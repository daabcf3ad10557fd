//! Cart Records

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use crate::{
    domain::catalog::records::{AddonUuid, ProductUuid, VariantUuid},
    identity::CustomerUuid,
    uuids::TypedUuid,
};

/// Cart Line UUID
pub type CartLineUuid = TypedUuid<CartLineRecord>;

/// An addon chosen for a cart line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddonSelection {
    pub addon_uuid: AddonUuid,
    pub quantity: u32,
}

/// Cart Line Record
///
/// `unit_price` is the catalog price captured when the line was added and only moves when
/// prices are explicitly refreshed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLineRecord {
    pub uuid: CartLineUuid,
    pub customer_uuid: CustomerUuid,
    pub product_uuid: ProductUuid,
    pub variant_uuid: Option<VariantUuid>,
    pub quantity: u32,
    pub unit_price: u64,
    pub addons: Vec<AddonSelection>,
    pub notes: String,
    pub selected: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
