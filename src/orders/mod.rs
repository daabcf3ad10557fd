//! Orders
//!
//! Pure order-side logic: assembling an immutable draft from a priced order, and the
//! lifecycle rules that govern an order after it has been created.

pub mod assembly;
pub mod lifecycle;

pub use assembly::{AssemblyError, OrderDetails, OrderDraft, OrderLineDraft, assemble};
pub use lifecycle::{
    InvalidTransition, Lifecycle, OrderStatus, OrderTransition, PaymentStatus, UnknownStatus,
};
