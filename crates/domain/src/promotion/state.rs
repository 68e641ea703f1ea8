//! Promotion lifecycle and payment states.

use serde::{Deserialize, Serialize};

/// Stored lifecycle status of a promotion.
///
/// State transitions:
/// ```text
/// Active ──────► Expired ──(extend)──► Active
///    │              │
///    └──────────────┴──────► Cancelled
/// ```
///
/// `Active` is a coarse record: a promotion whose end date has passed stays
/// `Active` until the expiry sweep reconciles it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PromotionStatus {
    #[default]
    Active,

    /// End date passed and the sweep has run.
    Expired,

    /// Terminal.
    Cancelled,
}

impl PromotionStatus {
    /// Returns true if the promotion can be cancelled in this state.
    pub fn can_cancel(&self) -> bool {
        !matches!(self, PromotionStatus::Cancelled)
    }

    /// Returns true if the end date can be pushed back in this state.
    pub fn can_extend(&self) -> bool {
        !matches!(self, PromotionStatus::Cancelled)
    }

    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PromotionStatus::Cancelled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PromotionStatus::Active => "ACTIVE",
            PromotionStatus::Expired => "EXPIRED",
            PromotionStatus::Cancelled => "CANCELLED",
        }
    }
}

impl std::fmt::Display for PromotionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Payment state of a promotion.
///
/// ```text
/// Pending ──► Paid ──► Refunded
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    Refunded,
}

impl PaymentStatus {
    /// Returns true if payment can be recorded in this state.
    pub fn can_mark_paid(&self) -> bool {
        matches!(self, PaymentStatus::Pending)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::Paid => "PAID",
            PaymentStatus::Refunded => "REFUNDED",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
