//! Application error types.

use domain::{DomainError, ErrorKind, ValidationError};
use store::StoreError;
use thiserror::Error;

/// Failure inside a credential collaborator (hashing, token storage).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialError {
    #[error("Password hashing failed")]
    Hash,

    #[error("Stored password hash is malformed")]
    MalformedHash,
}

/// Errors returned by every application service.
#[derive(Debug, Error)]
pub enum AppError {
    /// A domain rule was violated.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// The store rejected a read or write.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A credential collaborator failed.
    #[error("Credential error: {0}")]
    Credentials(#[from] CredentialError),
}

impl AppError {
    /// The caller-visible class of this error.
    ///
    /// `None` means the failure is internal and has no domain meaning.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            AppError::Domain(err) => Some(err.kind()),
            AppError::Store(err) => Some(DomainError::from(err.clone()).kind()),
            AppError::Credentials(_) => None,
        }
    }

    pub(crate) fn unauthorized(message: impl Into<String>) -> Self {
        AppError::Domain(DomainError::Unauthorized(message.into()))
    }

    pub(crate) fn not_found(entity: &'static str, id: impl ToString) -> Self {
        AppError::Domain(DomainError::not_found(entity, id))
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::Domain(err.into())
    }
}

/// Convenience type alias for service results.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_follows_wrapped_error() {
        let err = AppError::from(ValidationError::InvalidPriceRange);
        assert_eq!(err.kind(), Some(ErrorKind::Validation));

        let err = AppError::from(StoreError::duplicate("Vendor", "11222333000181"));
        assert_eq!(err.kind(), Some(ErrorKind::Conflict));

        let err = AppError::from(StoreError::Domain(DomainError::InsufficientStock {
            available: 0,
            requested: 1,
        }));
        assert_eq!(err.kind(), Some(ErrorKind::InsufficientStock));

        assert_eq!(AppError::from(CredentialError::Hash).kind(), None);
    }
}
