//! Time-boxed, paid, priority-ranked listing of a product.

mod state;

pub use state::{PaymentStatus, PromotionStatus};

use chrono::{DateTime, Duration, Utc};
use common::{ProductId, PromotionId};
use serde::Serialize;

use crate::error::{DomainError, Result, ValidationError};

/// Lowest allowed priority.
pub const MIN_PRIORITY: u8 = 1;
/// Highest allowed priority. Higher is more visible.
pub const MAX_PRIORITY: u8 = 10;

/// Input for [`Promotion::create`].
#[derive(Debug, Clone)]
pub struct NewPromotion {
    pub product_id: ProductId,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub priority: u8,
}

/// Result of [`Promotion::cancel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Cancellation {
    /// True when payment moved to `Refunded`.
    pub refunded: bool,
}

/// Result of [`Promotion::expire`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpireOutcome {
    /// The promotion moved from `Active` to `Expired`.
    Expired,
    /// Already `Expired`; nothing changed.
    AlreadyExpired,
    /// Still `Active` and its end date has not passed.
    NotYetDue,
    /// `Cancelled` promotions are never expired.
    Skipped,
}

impl ExpireOutcome {
    /// Returns true if this call changed the promotion.
    pub fn transitioned(&self) -> bool {
        matches!(self, ExpireOutcome::Expired)
    }
}

/// A promotion ("ad") for one product.
///
/// Built only through [`Promotion::create`]:
///
/// ```compile_fail
/// let promotion: domain::Promotion = serde_json::from_str("{}").unwrap();
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Promotion {
    id: PromotionId,
    product_id: ProductId,
    starts_at: DateTime<Utc>,
    ends_at: DateTime<Utc>,
    priority: u8,
    status: PromotionStatus,
    payment_status: PaymentStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn validate_priority(priority: u8) -> Result<()> {
    if !(MIN_PRIORITY..=MAX_PRIORITY).contains(&priority) {
        return Err(ValidationError::InvalidPriority { priority }.into());
    }
    Ok(())
}

fn validate_window(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<()> {
    if end <= start {
        return Err(ValidationError::InvalidDateRange { start, end }.into());
    }
    Ok(())
}

/// Whole days in `span`, rounded up.
fn ceil_days(span: Duration) -> i64 {
    let day = Duration::days(1).num_milliseconds();
    let ms = span.num_milliseconds();
    (ms + day - 1).div_euclid(day)
}

impl Promotion {
    /// Creates an `Active` promotion awaiting payment.
    pub fn create(new: NewPromotion, now: DateTime<Utc>) -> Result<Self> {
        validate_window(new.starts_at, new.ends_at)?;
        validate_priority(new.priority)?;

        Ok(Self {
            id: PromotionId::new(),
            product_id: new.product_id,
            starts_at: new.starts_at,
            ends_at: new.ends_at,
            priority: new.priority,
            status: PromotionStatus::Active,
            payment_status: PaymentStatus::Pending,
            created_at: now,
            updated_at: now,
        })
    }
}

// Query methods
impl Promotion {
    pub fn id(&self) -> PromotionId {
        self.id
    }

    pub fn product_id(&self) -> ProductId {
        self.product_id
    }

    pub fn starts_at(&self) -> DateTime<Utc> {
        self.starts_at
    }

    pub fn ends_at(&self) -> DateTime<Utc> {
        self.ends_at
    }

    pub fn priority(&self) -> u8 {
        self.priority
    }

    pub fn status(&self) -> PromotionStatus {
        self.status
    }

    pub fn payment_status(&self) -> PaymentStatus {
        self.payment_status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn is_paid(&self) -> bool {
        self.payment_status == PaymentStatus::Paid
    }

    /// True once the end date has passed, regardless of stored status.
    pub fn is_past_end(&self, now: DateTime<Utc>) -> bool {
        now > self.ends_at
    }

    /// Effective visibility: `Active`, inside `[start, end]` and paid.
    ///
    /// Stored status alone is not enough; it can be stale until the sweep
    /// runs.
    pub fn is_active_now(&self, now: DateTime<Utc>) -> bool {
        self.status == PromotionStatus::Active
            && self.starts_at <= now
            && now <= self.ends_at
            && self.is_paid()
    }

    /// Paid and not yet started. Refunds are all-or-nothing.
    pub fn is_refund_eligible(&self, now: DateTime<Utc>) -> bool {
        self.is_paid() && now < self.starts_at
    }

    /// Length of the window in days, rounded up.
    pub fn duration_in_days(&self) -> i64 {
        ceil_days(self.ends_at - self.starts_at)
    }

    /// Days left until the end date, rounded up; 0 once it has passed.
    pub fn remaining_days(&self, now: DateTime<Utc>) -> i64 {
        if now >= self.ends_at {
            return 0;
        }
        ceil_days(self.ends_at - now)
    }

    pub fn ensure_paid(&self) -> Result<()> {
        if !self.is_paid() {
            return Err(DomainError::PaymentRequired);
        }
        Ok(())
    }
}

// Transitions
impl Promotion {
    /// Records payment. Only valid while payment is pending.
    pub fn mark_paid(&mut self, now: DateTime<Utc>) -> Result<()> {
        if !self.payment_status.can_mark_paid() {
            return Err(DomainError::InvalidTransition {
                current: self.payment_status.as_str(),
                action: "mark paid",
            });
        }
        self.payment_status = PaymentStatus::Paid;
        self.touch(now);
        Ok(())
    }

    /// Cancels the promotion, refunding it when it was paid and has not
    /// started yet.
    pub fn cancel(&mut self, now: DateTime<Utc>) -> Result<Cancellation> {
        if !self.status.can_cancel() {
            return Err(DomainError::InvalidTransition {
                current: self.status.as_str(),
                action: "cancel",
            });
        }

        let refunded = self.is_refund_eligible(now);
        if refunded {
            self.payment_status = PaymentStatus::Refunded;
        }
        self.status = PromotionStatus::Cancelled;
        self.touch(now);

        Ok(Cancellation { refunded })
    }

    /// Moves an `Active` promotion past its end date to `Expired`.
    ///
    /// Never fails: the sweep may call this speculatively on anything.
    pub fn expire(&mut self, now: DateTime<Utc>) -> ExpireOutcome {
        match self.status {
            PromotionStatus::Cancelled => ExpireOutcome::Skipped,
            PromotionStatus::Expired => ExpireOutcome::AlreadyExpired,
            PromotionStatus::Active if !self.is_past_end(now) => ExpireOutcome::NotYetDue,
            PromotionStatus::Active => {
                self.status = PromotionStatus::Expired;
                self.touch(now);
                ExpireOutcome::Expired
            }
        }
    }

    /// Pushes the end date back. An expired promotion whose new end lies in
    /// the future becomes `Active` again.
    pub fn extend(&mut self, new_end: DateTime<Utc>, now: DateTime<Utc>) -> Result<()> {
        if !self.status.can_extend() {
            return Err(DomainError::InvalidTransition {
                current: self.status.as_str(),
                action: "extend",
            });
        }
        if new_end <= self.ends_at {
            return Err(ValidationError::InvalidDateRange {
                start: self.ends_at,
                end: new_end,
            }
            .into());
        }

        self.ends_at = new_end;
        if self.status == PromotionStatus::Expired && new_end > now {
            self.status = PromotionStatus::Active;
        }
        self.touch(now);
        Ok(())
    }

    pub fn update_priority(&mut self, priority: u8, now: DateTime<Utc>) -> Result<()> {
        validate_priority(priority)?;
        self.priority = priority;
        self.touch(now);
        Ok(())
    }

    /// Re-activates a paid, unexpired promotion.
    pub fn activate(&mut self, now: DateTime<Utc>) -> Result<()> {
        if self.status.is_terminal() {
            return Err(DomainError::InvalidTransition {
                current: self.status.as_str(),
                action: "activate",
            });
        }
        if self.is_past_end(now) {
            return Err(DomainError::ExpiredPromotion);
        }
        self.ensure_paid()?;

        self.status = PromotionStatus::Active;
        self.touch(now);
        Ok(())
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }
}
