//! Order assembly
//!
//! Builds an [`OrderDraft`] from a [`PricedOrder`]. Every line carries its own copy of the
//! product/variant names and prices so later catalog edits never reach the order.

use thiserror::Error;
use uuid::Uuid;

use crate::pricing::{AddonSnapshot, PricedOrder, order_total};

/// Errors raised while assembling an order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssemblyError {
    /// A required order detail was empty.
    #[error("{0} is required")]
    MissingField(&'static str),

    /// `total != subtotal + tax + shipping - discount`.
    #[error(
        "order totals do not balance: {subtotal} + {tax} + {shipping} - {discount} != {total}"
    )]
    TotalsMismatch {
        /// Order subtotal.
        subtotal: u64,
        /// Order tax.
        tax: u64,
        /// Order shipping.
        shipping: u64,
        /// Order discount.
        discount: u64,
        /// Order total.
        total: u64,
    },

    /// Line subtotals do not add up to the order subtotal.
    #[error("line subtotals add up to {lines}, order subtotal is {subtotal}")]
    SubtotalMismatch {
        /// Sum of line subtotals, if representable.
        lines: u64,
        /// Order subtotal.
        subtotal: u64,
    },
}

/// Customer-supplied order details.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderDetails {
    /// Where to ship.
    pub shipping_address: String,

    /// Where to bill.
    pub billing_address: String,

    /// Payment method label, e.g. `"card"`.
    pub payment_method: String,

    /// Free-form notes.
    pub notes: String,
}

impl OrderDetails {
    /// Check that the required details are present.
    ///
    /// # Errors
    ///
    /// Returns [`AssemblyError::MissingField`] naming the first empty field.
    pub fn validate(&self) -> Result<(), AssemblyError> {
        for (field, value) in [
            ("shipping address", &self.shipping_address),
            ("billing address", &self.billing_address),
            ("payment method", &self.payment_method),
        ] {
            if value.trim().is_empty() {
                return Err(AssemblyError::MissingField(field));
            }
        }

        Ok(())
    }
}

/// Snapshot of one order line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderLineDraft {
    /// 1-based position within the order.
    pub position: u32,

    /// Product identifier.
    pub product: Uuid,

    /// Variant identifier.
    pub variant: Option<Uuid>,

    /// Product name at order time.
    pub product_name: String,

    /// Variant name at order time.
    pub variant_name: Option<String>,

    /// Number of units.
    pub quantity: u32,

    /// Price per unit at order time.
    pub unit_price: u64,

    /// Addons at order time.
    pub addons: Vec<AddonSnapshot>,

    /// Line subtotal.
    pub line_subtotal: u64,
}

/// An order ready to be persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderDraft {
    uuid: Uuid,
    order_number: String,
    customer: Uuid,
    details: OrderDetails,
    subtotal: u64,
    tax: u64,
    shipping: u64,
    discount: u64,
    total: u64,
    lines: Vec<OrderLineDraft>,
}

impl OrderDraft {
    /// Order identifier.
    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    /// Human-legible order number.
    pub fn order_number(&self) -> &str {
        &self.order_number
    }

    /// Owning customer.
    pub fn customer(&self) -> Uuid {
        self.customer
    }

    /// Addresses, payment method and notes.
    pub fn details(&self) -> &OrderDetails {
        &self.details
    }

    /// Sum of line subtotals.
    pub fn subtotal(&self) -> u64 {
        self.subtotal
    }

    /// Tax.
    pub fn tax(&self) -> u64 {
        self.tax
    }

    /// Shipping.
    pub fn shipping(&self) -> u64 {
        self.shipping
    }

    /// Discount.
    pub fn discount(&self) -> u64 {
        self.discount
    }

    /// Total charged.
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Line snapshots in position order.
    pub fn lines(&self) -> &[OrderLineDraft] {
        &self.lines
    }

    /// Replace the order number after a uniqueness collision.
    pub fn renumber(&mut self, order_number: String) {
        self.order_number = order_number;
    }

    /// Re-check the monetary invariants.
    ///
    /// # Errors
    ///
    /// Returns [`AssemblyError::SubtotalMismatch`] or [`AssemblyError::TotalsMismatch`].
    pub fn verify(&self) -> Result<(), AssemblyError> {
        let lines = self
            .lines
            .iter()
            .try_fold(0_u64, |acc, line| acc.checked_add(line.line_subtotal));

        if lines != Some(self.subtotal) {
            return Err(AssemblyError::SubtotalMismatch {
                lines: lines.unwrap_or(u64::MAX),
                subtotal: self.subtotal,
            });
        }

        if order_total(self.subtotal, self.tax, self.shipping, self.discount) != Some(self.total) {
            return Err(AssemblyError::TotalsMismatch {
                subtotal: self.subtotal,
                tax: self.tax,
                shipping: self.shipping,
                discount: self.discount,
                total: self.total,
            });
        }

        Ok(())
    }
}

/// Assemble an order draft for `customer`.
///
/// # Errors
///
/// - [`AssemblyError::MissingField`]: a required detail or the order number is empty.
/// - [`AssemblyError::SubtotalMismatch`] / [`AssemblyError::TotalsMismatch`]: the priced
///   order does not balance.
pub fn assemble(
    customer: Uuid,
    details: OrderDetails,
    priced: PricedOrder,
    order_number: String,
) -> Result<OrderDraft, AssemblyError> {
    details.validate()?;

    if order_number.trim().is_empty() {
        return Err(AssemblyError::MissingField("order number"));
    }

    let (subtotal, tax, shipping, discount, total) = (
        priced.subtotal(),
        priced.tax(),
        priced.shipping(),
        priced.discount(),
        priced.total(),
    );

    let lines = priced
        .into_lines()
        .into_iter()
        .zip(1_u32..)
        .map(|(line, position)| OrderLineDraft {
            position,
            product: line.product,
            variant: line.variant,
            product_name: line.product_name,
            variant_name: line.variant_name,
            quantity: line.quantity,
            unit_price: line.unit_price,
            addons: line.addons,
            line_subtotal: line.line_subtotal,
        })
        .collect();

    let draft = OrderDraft {
        uuid: Uuid::now_v7(),
        order_number,
        customer,
        details,
        subtotal,
        tax,
        shipping,
        discount,
        total,
        lines,
    };

    draft.verify()?;

    Ok(draft)
}
