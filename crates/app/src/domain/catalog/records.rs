//! Catalog Records

use crate::uuids::TypedUuid;

/// Product UUID
pub type ProductUuid = TypedUuid<ProductRecord>;

/// Product Variant UUID
pub type VariantUuid = TypedUuid<VariantRecord>;

/// Product Addon UUID
pub type AddonUuid = TypedUuid<AddonRecord>;

/// Product Record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductRecord {
    pub uuid: ProductUuid,
    pub name: String,
    pub price: u64,
}

/// Variant Record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantRecord {
    pub uuid: VariantUuid,
    pub product_uuid: ProductUuid,
    pub name: String,
    pub price: u64,
}

/// Addon Record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddonRecord {
    pub uuid: AddonUuid,
    pub name: String,
    pub price: u64,
    pub max_quantity: u32,
}

/// Current price of a product, or of one of its variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceQuote {
    pub product_uuid: ProductUuid,
    pub variant_uuid: Option<VariantUuid>,
    pub unit_price: u64,
    pub product_name: String,
    pub variant_name: Option<String>,
}
