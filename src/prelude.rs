//! Kasa prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    money::{
        AmountError, currency, format_minor, parse_minor, parse_percentage, percent_of_minor,
    },
    orders::{
        AssemblyError, InvalidTransition, Lifecycle, OrderDetails, OrderDraft, OrderLineDraft,
        OrderStatus, OrderTransition, PaymentStatus, UnknownStatus, assemble,
    },
    pricing::{
        AddonQuote, AddonSnapshot, FlatShipping, FreeShippingOver, LineAddon, LineInput,
        PercentageTax, PricedLine, PricedOrder, PricingEngine, PricingError, ShippingPolicy,
        TaxPolicy, order_total,
    },
};
