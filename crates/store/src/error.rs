use domain::DomainError;
use thiserror::Error;

/// Errors that can occur when reading or writing entities.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    /// `update` was called for an entity that was never saved.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// `save` would break a uniqueness rule.
    #[error("{entity} already exists: {key}")]
    Duplicate { entity: &'static str, key: String },

    /// The entity was written by someone else since it was read.
    #[error("{entity} {id} was modified concurrently: expected version {expected}, found {actual}")]
    VersionConflict {
        entity: &'static str,
        id: String,
        expected: u64,
        actual: u64,
    },

    /// A domain rule rejected an operation performed under the store lock.
    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl StoreError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        StoreError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn duplicate(entity: &'static str, key: impl ToString) -> Self {
        StoreError::Duplicate {
            entity,
            key: key.to_string(),
        }
    }
}

impl From<StoreError> for DomainError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity, id } => DomainError::NotFound { entity, id },
            StoreError::Duplicate { entity, key } => {
                DomainError::Conflict(format!("{entity} already exists: {key}"))
            }
            conflict @ StoreError::VersionConflict { .. } => {
                DomainError::Conflict(conflict.to_string())
            }
            StoreError::Domain(err) => err,
        }
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
