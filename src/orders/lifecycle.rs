//! Order lifecycle
//!
//! ```text
//! pending ──cancel──▶ cancelled
//!    │
//!    └──mark paid──▶ paid ──complete──▶ completed
//! ```

use std::{fmt, str::FromStr};

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Order status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Created, awaiting payment.
    Pending,

    /// Payment received.
    Paid,

    /// Fulfilled. Terminal.
    Completed,

    /// Cancelled before payment. Terminal.
    Cancelled,
}

impl OrderStatus {
    /// Stable storage representation.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Whether no further transition is possible.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// The status reached by applying `transition`.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidTransition`] when `transition` is not legal from this status.
    pub fn next(self, transition: OrderTransition) -> Result<Self, InvalidTransition> {
        match (self, transition) {
            (Self::Pending, OrderTransition::Cancel) => Ok(Self::Cancelled),
            (Self::Pending, OrderTransition::MarkPaid) => Ok(Self::Paid),
            (Self::Paid, OrderTransition::Complete) => Ok(Self::Completed),
            (from, transition) => Err(InvalidTransition { from, transition }),
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored status string that is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for OrderStatus {
    type Err = UnknownStatus;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// Payment status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// No payment recorded.
    Unpaid,

    /// Payment recorded.
    Paid,
}

impl PaymentStatus {
    /// Stable storage representation.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unpaid => "unpaid",
            Self::Paid => "paid",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = UnknownStatus;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "unpaid" => Ok(Self::Unpaid),
            "paid" => Ok(Self::Paid),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// Post-creation transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderTransition {
    /// Customer cancels a pending order.
    Cancel,

    /// Payment confirmed by the system.
    MarkPaid,

    /// Fulfilment confirmed by the system.
    Complete,
}

impl fmt::Display for OrderTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Cancel => "cancel",
            Self::MarkPaid => "mark as paid",
            Self::Complete => "complete",
        })
    }
}

/// A transition that is not legal from the current status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("cannot {transition} an order that is {from}")]
pub struct InvalidTransition {
    /// Status the order was in.
    pub from: OrderStatus,

    /// The rejected transition.
    pub transition: OrderTransition,
}

/// The mutable part of an order: status and the timestamps that go with it.
///
/// Money and lines are not part of the lifecycle and cannot be touched by a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lifecycle {
    /// Current order status.
    pub status: OrderStatus,

    /// Current payment status.
    pub payment_status: PaymentStatus,

    /// When payment was recorded.
    pub paid_at: Option<Timestamp>,

    /// When the order was cancelled.
    pub canceled_at: Option<Timestamp>,

    /// When the order was completed.
    pub completed_at: Option<Timestamp>,
}

impl Lifecycle {
    /// Lifecycle of a freshly created order.
    pub const fn pending() -> Self {
        Self {
            status: OrderStatus::Pending,
            payment_status: PaymentStatus::Unpaid,
            paid_at: None,
            canceled_at: None,
            completed_at: None,
        }
    }

    /// Apply `transition` at time `at`.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidTransition`] when the transition is not legal from the current status.
    pub fn apply(self, transition: OrderTransition, at: Timestamp) -> Result<Self, InvalidTransition> {
        let status = self.status.next(transition)?;

        Ok(match transition {
            OrderTransition::Cancel => Self {
                status,
                canceled_at: Some(at),
                ..self
            },
            OrderTransition::MarkPaid => Self {
                status,
                payment_status: PaymentStatus::Paid,
                paid_at: Some(at),
                ..self
            },
            OrderTransition::Complete => Self {
                status,
                completed_at: Some(at),
                ..self
            },
        })
    }
}
