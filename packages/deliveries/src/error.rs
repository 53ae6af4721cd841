use engage_core::{RevisionStatus, ValidationError};
use engage_storage::StorageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// A status precondition did not hold; refresh and retry
    #[error("Conflicting state: {0}")]
    ConflictingState(String),

    #[error("Invalid transition for revision request {id}: {from} -> {to}")]
    InvalidTransition {
        id: String,
        from: RevisionStatus,
        to: RevisionStatus,
    },

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Storage error: {0}")]
    Storage(StorageError),
}

impl From<StorageError> for DeliveryError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Conflict { .. } => DeliveryError::ConflictingState(err.to_string()),
            StorageError::NotFound { entity, id } => DeliveryError::NotFound { entity, id },
            other => DeliveryError::Storage(other),
        }
    }
}

impl DeliveryError {
    pub fn is_conflicting_state(&self) -> bool {
        matches!(self, DeliveryError::ConflictingState(_))
    }
}

pub type DeliveryResult<T> = Result<T, DeliveryError>;
