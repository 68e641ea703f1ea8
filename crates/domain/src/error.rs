//! Domain error types.
//!
//! Every rule violation is raised where it is detected and returned to the
//! caller unchanged. The core never logs or swallows these errors.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Malformed input rejected by a value object or entity.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Invalid tax id: {0}")]
    InvalidTaxId(String),

    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    #[error("Invalid coordinates: latitude={latitude}, longitude={longitude}")]
    InvalidCoordinates { latitude: f64, longitude: f64 },

    #[error("Price out of range: {cents} cents")]
    InvalidPrice { cents: i64 },

    #[error("Invalid volume: {millilitres}ml")]
    InvalidVolume { millilitres: u32 },

    #[error("Quantity must be positive: {quantity}")]
    InvalidQuantity { quantity: u32 },

    #[error("Priority must be between 1 and 10: {priority}")]
    InvalidPriority { priority: u8 },

    #[error("End date {end} must be after start date {start}")]
    InvalidDateRange {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    #[error("Start date {start} cannot be in the past")]
    StartInPast { start: DateTime<Utc> },

    #[error("Radius must be greater than 0 and at most {max} meters: {meters}")]
    InvalidRadius { meters: f64, max: f64 },

    #[error("{field} must have at least {min} characters")]
    InvalidName { field: &'static str, min: usize },

    #[error("Min price cannot be greater than max price")]
    InvalidPriceRange,

    #[error("Password must be at least {min} characters long")]
    WeakPassword { min: usize },

    #[error("Passwords do not match")]
    PasswordMismatch,

    #[error("User must confirm being at least 18 years old")]
    AdultConfirmationRequired,

    #[error("Invalid pagination: {0}")]
    InvalidPage(String),

    #[error("{0}")]
    Other(String),
}

/// The caller-visible class of a [`DomainError`].
///
/// Each kind maps to exactly one outcome at the presentation boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Unauthorized,
    Conflict,
    InsufficientStock,
    ExpiredPromotion,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation_error",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::Conflict => "conflict",
            ErrorKind::InsufficientStock => "insufficient_stock",
            ErrorKind::ExpiredPromotion => "expired_promotion",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Errors that can occur during domain operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DomainError {
    /// Malformed input.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A referenced entity does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// The actor lacks rights over the target entity.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// A uniqueness rule was violated.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A stock decrement exceeds what is available.
    #[error("Insufficient stock: available={available}, requested={requested}")]
    InsufficientStock { available: u32, requested: u32 },

    /// Attempted to activate a promotion whose end date has passed.
    #[error("Promotion has expired")]
    ExpiredPromotion,

    /// The entity is not in a state that allows the action.
    #[error("Invalid state transition: cannot {action} from {current} state")]
    InvalidTransition {
        current: &'static str,
        action: &'static str,
    },

    /// The action needs a paid promotion.
    #[error("Promotion payment is pending")]
    PaymentRequired,
}

impl DomainError {
    /// Shorthand for a [`DomainError::NotFound`].
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        DomainError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Returns the caller-visible class of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            DomainError::Validation(_)
            | DomainError::InvalidTransition { .. }
            | DomainError::PaymentRequired => ErrorKind::Validation,
            DomainError::NotFound { .. } => ErrorKind::NotFound,
            DomainError::Unauthorized(_) => ErrorKind::Unauthorized,
            DomainError::Conflict(_) => ErrorKind::Conflict,
            DomainError::InsufficientStock { .. } => ErrorKind::InsufficientStock,
            DomainError::ExpiredPromotion => ErrorKind::ExpiredPromotion,
        }
    }
}

/// Convenience type alias for domain results.
pub type Result<T> = std::result::Result<T, DomainError>;
