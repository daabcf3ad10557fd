//! Cart Data

use crate::domain::{
    carts::records::{AddonSelection, CartLineUuid},
    catalog::records::{ProductUuid, VariantUuid},
};

/// New Cart Line Data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCartLine {
    pub uuid: CartLineUuid,
    pub product_uuid: ProductUuid,
    pub variant_uuid: Option<VariantUuid>,
    pub quantity: u32,
    pub addons: Vec<AddonSelection>,
    pub notes: String,
}

/// Cart Line Patch
///
/// `None` leaves the attribute as it is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CartLinePatch {
    pub quantity: Option<u32>,
    pub addons: Option<Vec<AddonSelection>>,
    pub notes: Option<String>,
    pub selected: Option<bool>,
}

impl CartLinePatch {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.quantity.is_none()
            && self.addons.is_none()
            && self.notes.is_none()
            && self.selected.is_none()
    }
}
