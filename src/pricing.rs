//! Pricing
//!
//! Turns resolved cart lines into a [`PricedOrder`]. The engine is deterministic given its
//! inputs and the injected tax and shipping policies; it performs no I/O.

use std::{fmt::Debug, sync::Arc};

use decimal_percentage::Percentage;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use thiserror::Error;
use uuid::Uuid;

use crate::money::{AmountError, percent_of_minor};

/// Largest amount, in minor units, that an order or any of its parts may reach.
///
/// Amounts are stored as signed 64-bit integers.
pub const MAX_AMOUNT: u64 = i64::MAX.unsigned_abs();

/// Errors that can occur while pricing an order.
#[derive(Debug, Error)]
pub enum PricingError {
    /// Nothing was selected, so there is nothing to price.
    #[error("no lines to price")]
    NoLines,

    /// A line or addon was requested with a zero quantity.
    #[error("quantity must be greater than zero for product {product}")]
    ZeroQuantity {
        /// Product the offending line refers to.
        product: Uuid,
    },

    /// An addon was selected but no current price could be resolved for it.
    #[error("no price available for addon {addon}")]
    AddonPricingUnavailable {
        /// The unresolved addon.
        addon: Uuid,
    },

    /// A monetary amount exceeded the representable range.
    #[error("amount overflowed while pricing")]
    Overflow,

    /// Wrapped percentage or amount conversion error.
    #[error(transparent)]
    Amount(#[from] AmountError),
}

/// An addon chosen on a line, as stored on the cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LineAddon {
    /// Addon identifier.
    pub addon: Uuid,

    /// Addons per unit of the line.
    pub quantity: u32,
}

/// Current catalog price for an addon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddonQuote {
    /// Display name at the time of the quote.
    pub name: String,

    /// Price per addon in minor units.
    pub unit_price: u64,
}

/// Frozen copy of an addon as it was charged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddonSnapshot {
    /// Addon identifier.
    pub addon: Uuid,

    /// Addon name when the order was placed.
    pub name: String,

    /// Addons per unit of the line.
    pub quantity: u32,

    /// Price per addon in minor units.
    pub unit_price: u64,
}

/// A cart line with its product identity resolved, ready to be priced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineInput {
    /// Product identifier.
    pub product: Uuid,

    /// Variant identifier, when one was chosen.
    pub variant: Option<Uuid>,

    /// Product name to snapshot.
    pub product_name: String,

    /// Variant name to snapshot.
    pub variant_name: Option<String>,

    /// Number of units.
    pub quantity: u32,

    /// Price per unit in minor units.
    pub unit_price: u64,

    /// Addons selected for each unit.
    pub addons: SmallVec<[LineAddon; 4]>,
}

/// A single priced line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedLine {
    /// Product identifier.
    pub product: Uuid,

    /// Variant identifier.
    pub variant: Option<Uuid>,

    /// Product name snapshot.
    pub product_name: String,

    /// Variant name snapshot.
    pub variant_name: Option<String>,

    /// Number of units.
    pub quantity: u32,

    /// Price per unit in minor units, excluding addons.
    pub unit_price: u64,

    /// Addons as they were charged.
    pub addons: Vec<AddonSnapshot>,

    /// `(unit_price + addons per unit) * quantity`.
    pub line_subtotal: u64,
}

/// Output of the pricing engine for one checkout attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedOrder {
    lines: Vec<PricedLine>,
    subtotal: u64,
    tax: u64,
    shipping: u64,
    discount: u64,
    total: u64,
}

impl PricedOrder {
    /// Priced lines in input order.
    pub fn lines(&self) -> &[PricedLine] {
        &self.lines
    }

    /// Sum of line subtotals.
    pub fn subtotal(&self) -> u64 {
        self.subtotal
    }

    /// Tax charged on the subtotal.
    pub fn tax(&self) -> u64 {
        self.tax
    }

    /// Shipping charge.
    pub fn shipping(&self) -> u64 {
        self.shipping
    }

    /// Discount applied.
    pub fn discount(&self) -> u64 {
        self.discount
    }

    /// `subtotal + tax + shipping - discount`.
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Consume the order, returning its lines.
    pub fn into_lines(self) -> Vec<PricedLine> {
        self.lines
    }
}

/// Calculates tax owed on an order subtotal.
pub trait TaxPolicy: Debug + Send + Sync {
    /// Tax in minor units for the given subtotal.
    ///
    /// # Errors
    ///
    /// Returns an error if the tax cannot be represented in minor units.
    fn tax(&self, subtotal: u64) -> Result<u64, PricingError>;
}

/// Calculates the shipping charge for an order.
pub trait ShippingPolicy: Debug + Send + Sync {
    /// Shipping in minor units for the priced lines.
    fn shipping(&self, lines: &[PricedLine], subtotal: u64) -> u64;
}

/// Flat percentage of the subtotal.
#[derive(Debug, Clone, Copy)]
pub struct PercentageTax {
    rate: Percentage,
}

impl PercentageTax {
    /// Creates a tax policy charging `rate` of the subtotal.
    pub fn new(rate: Percentage) -> Self {
        Self { rate }
    }
}

impl TaxPolicy for PercentageTax {
    fn tax(&self, subtotal: u64) -> Result<u64, PricingError> {
        Ok(percent_of_minor(&self.rate, subtotal)?)
    }
}

/// Same shipping fee for every order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlatShipping {
    fee: u64,
}

impl FlatShipping {
    /// Creates a policy charging `fee` minor units per order.
    pub fn new(fee: u64) -> Self {
        Self { fee }
    }
}

impl ShippingPolicy for FlatShipping {
    fn shipping(&self, _lines: &[PricedLine], _subtotal: u64) -> u64 {
        self.fee
    }
}

/// Flat fee, waived once the subtotal reaches a threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreeShippingOver {
    threshold: u64,
    fee: u64,
}

impl FreeShippingOver {
    /// Charge `fee` unless the subtotal is at least `threshold`.
    pub fn new(threshold: u64, fee: u64) -> Self {
        Self { threshold, fee }
    }
}

impl ShippingPolicy for FreeShippingOver {
    fn shipping(&self, _lines: &[PricedLine], subtotal: u64) -> u64 {
        if subtotal >= self.threshold {
            0
        } else {
            self.fee
        }
    }
}

/// Prices resolved lines using injected tax and shipping policies.
#[derive(Debug, Clone)]
pub struct PricingEngine {
    tax: Arc<dyn TaxPolicy>,
    shipping: Arc<dyn ShippingPolicy>,
}

impl PricingEngine {
    /// Creates an engine with the given policies.
    pub fn new(tax: impl TaxPolicy + 'static, shipping: impl ShippingPolicy + 'static) -> Self {
        Self {
            tax: Arc::new(tax),
            shipping: Arc::new(shipping),
        }
    }

    /// Price the given lines.
    ///
    /// Every addon referenced by a line must have an entry in `addon_quotes`.
    ///
    /// # Errors
    ///
    /// - [`PricingError::NoLines`]: `lines` is empty.
    /// - [`PricingError::ZeroQuantity`]: a line or addon has a zero quantity.
    /// - [`PricingError::AddonPricingUnavailable`]: an addon has no quote.
    /// - [`PricingError::Overflow`]: an amount exceeded `u64`.
    pub fn price(
        &self,
        lines: &[LineInput],
        addon_quotes: &FxHashMap<Uuid, AddonQuote>,
    ) -> Result<PricedOrder, PricingError> {
        if lines.is_empty() {
            return Err(PricingError::NoLines);
        }

        let lines = lines
            .iter()
            .map(|line| price_line(line, addon_quotes))
            .collect::<Result<Vec<_>, _>>()?;

        let subtotal = lines
            .iter()
            .try_fold(0_u64, |acc, line| acc.checked_add(line.line_subtotal))
            .ok_or(PricingError::Overflow)?;

        let tax = self.tax.tax(subtotal)?;
        let shipping = self.shipping.shipping(&lines, subtotal);
        let discount = 0;

        let total = order_total(subtotal, tax, shipping, discount)
            .and_then(bounded)
            .ok_or(PricingError::Overflow)?;

        Ok(PricedOrder {
            lines,
            subtotal,
            tax,
            shipping,
            discount,
            total,
        })
    }
}

fn bounded(amount: u64) -> Option<u64> {
    (amount <= MAX_AMOUNT).then_some(amount)
}

/// `subtotal + tax + shipping - discount`, or `None` when out of range.
pub fn order_total(subtotal: u64, tax: u64, shipping: u64, discount: u64) -> Option<u64> {
    subtotal
        .checked_add(tax)?
        .checked_add(shipping)?
        .checked_sub(discount)
}

fn price_line(
    line: &LineInput,
    addon_quotes: &FxHashMap<Uuid, AddonQuote>,
) -> Result<PricedLine, PricingError> {
    if line.quantity == 0 {
        return Err(PricingError::ZeroQuantity {
            product: line.product,
        });
    }

    let mut addons = Vec::with_capacity(line.addons.len());
    let mut addons_per_unit = 0_u64;

    for selection in &line.addons {
        if selection.quantity == 0 {
            return Err(PricingError::ZeroQuantity {
                product: line.product,
            });
        }

        let quote =
            addon_quotes
                .get(&selection.addon)
                .ok_or(PricingError::AddonPricingUnavailable {
                    addon: selection.addon,
                })?;

        let cost = quote
            .unit_price
            .checked_mul(u64::from(selection.quantity))
            .ok_or(PricingError::Overflow)?;

        addons_per_unit = addons_per_unit
            .checked_add(cost)
            .ok_or(PricingError::Overflow)?;

        addons.push(AddonSnapshot {
            addon: selection.addon,
            name: quote.name.clone(),
            quantity: selection.quantity,
            unit_price: quote.unit_price,
        });
    }

    let line_subtotal = line
        .unit_price
        .checked_add(addons_per_unit)
        .and_then(|per_unit| per_unit.checked_mul(u64::from(line.quantity)))
        .and_then(bounded)
        .ok_or(PricingError::Overflow)?;

    Ok(PricedLine {
        product: line.product,
        variant: line.variant,
        product_name: line.product_name.clone(),
        variant_name: line.variant_name.clone(),
        quantity: line.quantity,
        unit_price: line.unit_price,
        addons,
        line_subtotal,
    })
}

#[cfg(test)]
mod tests {
    use smallvec::smallvec;
    use testresult::TestResult;

    use super::*;

    fn engine() -> PricingEngine {
        PricingEngine::new(
            PercentageTax::new(Percentage::from(0.1)),
            FlatShipping::new(10_00),
        )
    }

    fn line(unit_price: u64, quantity: u32) -> LineInput {
        LineInput {
            product: Uuid::now_v7(),
            variant: None,
            product_name: "Espresso".to_string(),
            variant_name: None,
            quantity,
            unit_price,
            addons: SmallVec::new(),
        }
    }

    #[test]
    fn prices_single_line_with_tax_and_flat_shipping() -> TestResult {
        let priced = engine().price(&[line(15_00, 2)], &FxHashMap::default())?;

        assert_eq!(priced.subtotal(), 30_00);
        assert_eq!(priced.tax(), 3_00);
        assert_eq!(priced.shipping(), 10_00);
        assert_eq!(priced.discount(), 0);
        assert_eq!(priced.total(), 43_00);

        Ok(())
    }

    #[test]
    fn addon_costs_are_charged_per_unit() -> TestResult {
        let syrup = Uuid::now_v7();
        let mut input = line(4_00, 3);
        input.addons = smallvec![LineAddon {
            addon: syrup,
            quantity: 2,
        }];

        let mut quotes = FxHashMap::default();
        quotes.insert(
            syrup,
            AddonQuote {
                name: "Vanilla syrup".to_string(),
                unit_price: 50,
            },
        );

        let priced = engine().price(&[input], &quotes)?;
        let first = priced.lines().first().ok_or("missing line")?;

        // (4.00 + 2 x 0.50) x 3
        assert_eq!(first.line_subtotal, 15_00);
        assert_eq!(
            first.addons,
            vec![AddonSnapshot {
                addon: syrup,
                name: "Vanilla syrup".to_string(),
                quantity: 2,
                unit_price: 50,
            }]
        );
        assert_eq!(priced.subtotal(), 15_00);

        Ok(())
    }

    #[test]
    fn unresolved_addon_is_a_hard_error() {
        let missing = Uuid::now_v7();
        let mut input = line(4_00, 1);
        input.addons = smallvec![LineAddon {
            addon: missing,
            quantity: 1,
        }];

        let result = engine().price(&[input], &FxHashMap::default());

        assert!(
            matches!(result, Err(PricingError::AddonPricingUnavailable { addon }) if addon == missing),
            "expected AddonPricingUnavailable, got {result:?}"
        );
    }

    #[test]
    fn empty_input_is_rejected() {
        assert!(matches!(
            engine().price(&[], &FxHashMap::default()),
            Err(PricingError::NoLines)
        ));
    }

    #[test]
    fn zero_quantity_is_rejected() {
        assert!(matches!(
            engine().price(&[line(1_00, 0)], &FxHashMap::default()),
            Err(PricingError::ZeroQuantity { .. })
        ));
    }

    #[test]
    fn overflowing_line_is_rejected() {
        assert!(matches!(
            engine().price(&[line(u64::MAX, 2)], &FxHashMap::default()),
            Err(PricingError::Overflow)
        ));
    }

    #[test]
    fn amounts_beyond_storage_range_are_rejected() {
        let result = engine().price(&[line(MAX_AMOUNT, 2)], &FxHashMap::default());

        assert!(
            matches!(result, Err(PricingError::Overflow)),
            "expected Overflow, got {result:?}"
        );

        let result = engine().price(&[line(MAX_AMOUNT - 5_00, 1)], &FxHashMap::default());

        assert!(
            matches!(result, Err(PricingError::Overflow)),
            "expected Overflow once tax and shipping are added, got {result:?}"
        );
    }

    #[test]
    fn free_shipping_applies_at_threshold() -> TestResult {
        let engine = PricingEngine::new(
            PercentageTax::new(Percentage::from(0.0)),
            FreeShippingOver::new(50_00, 4_99),
        );

        let below = engine.price(&[line(49_99, 1)], &FxHashMap::default())?;
        let at = engine.price(&[line(50_00, 1)], &FxHashMap::default())?;

        assert_eq!(below.shipping(), 4_99);
        assert_eq!(at.shipping(), 0);
        assert_eq!(at.total(), 50_00);

        Ok(())
    }

    #[test]
    fn totals_always_balance() -> TestResult {
        let lines = [line(3_33, 7), line(12_49, 1), line(99, 13)];
        let priced = engine().price(&lines, &FxHashMap::default())?;

        assert_eq!(
            order_total(
                priced.subtotal(),
                priced.tax(),
                priced.shipping(),
                priced.discount()
            ),
            Some(priced.total())
        );

        Ok(())
    }
}
