//! Identities
//!
//! Who is acting on a cart or order. Credentials are handled upstream; by the time a
//! [`Principal`] reaches this crate it has already been authenticated.

use std::fmt;

use thiserror::Error;

use crate::uuids::TypedUuid;

/// Customer marker.
#[derive(Debug)]
pub enum Customer {}

/// Customer UUID
pub type CustomerUuid = TypedUuid<Customer>;

/// A trusted internal actor, e.g. a payment webhook or fulfilment worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemIdentity {
    name: String,
}

impl SystemIdentity {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for SystemIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "system:{}", self.name)
    }
}

/// Actions gated at the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    ManageCart,
    Checkout,
    ViewOrders,
    CancelOrder,
    MarkOrderPaid,
    CompleteOrder,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ManageCart => "manage cart",
            Self::Checkout => "check out",
            Self::ViewOrders => "view orders",
            Self::CancelOrder => "cancel order",
            Self::MarkOrderPaid => "mark order paid",
            Self::CompleteOrder => "complete order",
        })
    }
}

const CUSTOMER_CAPABILITIES: &[Capability] = &[
    Capability::ManageCart,
    Capability::Checkout,
    Capability::ViewOrders,
    Capability::CancelOrder,
];

const SYSTEM_CAPABILITIES: &[Capability] = &[Capability::MarkOrderPaid, Capability::CompleteOrder];

#[derive(Debug, Error)]
#[error("{principal} may not {capability}")]
pub struct Forbidden {
    pub principal: String,
    pub capability: Capability,
}

/// An authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Principal {
    Customer(CustomerUuid),
    System(SystemIdentity),
}

impl Principal {
    #[must_use]
    pub fn capabilities(&self) -> &'static [Capability] {
        match self {
            Self::Customer(_) => CUSTOMER_CAPABILITIES,
            Self::System(_) => SYSTEM_CAPABILITIES,
        }
    }

    /// Check that this principal holds `capability`.
    ///
    /// # Errors
    ///
    /// Returns [`Forbidden`] when it does not.
    pub fn require(&self, capability: Capability) -> Result<(), Forbidden> {
        if self.capabilities().contains(&capability) {
            return Ok(());
        }

        Err(Forbidden {
            principal: self.to_string(),
            capability,
        })
    }

    #[must_use]
    pub fn customer(&self) -> Option<CustomerUuid> {
        match self {
            Self::Customer(customer) => Some(*customer),
            Self::System(_) => None,
        }
    }

    #[must_use]
    pub fn system(&self) -> Option<&SystemIdentity> {
        match self {
            Self::Customer(_) => None,
            Self::System(system) => Some(system),
        }
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Customer(customer) => write!(f, "customer:{customer}"),
            Self::System(system) => system.fmt(f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn customers_cannot_drive_payment_transitions() {
        let principal = Principal::Customer(CustomerUuid::new());

        assert!(principal.require(Capability::Checkout).is_ok());
        assert!(principal.require(Capability::CancelOrder).is_ok());

        let result = principal.require(Capability::MarkOrderPaid);

        assert!(
            matches!(
                result,
                Err(Forbidden {
                    capability: Capability::MarkOrderPaid,
                    ..
                })
            ),
            "expected Forbidden, got {result:?}"
        );
    }

    #[test]
    fn system_cannot_check_out() {
        let principal = Principal::System(SystemIdentity::new("payments"));

        assert!(principal.require(Capability::CompleteOrder).is_ok());
        assert!(principal.require(Capability::Checkout).is_err());
        assert_eq!(principal.customer(), None);
        assert_eq!(principal.to_string(), "system:payments");
    }
}
