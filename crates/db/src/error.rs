//! Store-level errors.

use thiserror::Error;
use vidtube_common::AppError;

/// Result type returned by [`crate::DocumentStore`] implementations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised by the entity store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique index rejected the write; the store is unchanged.
    #[error("duplicate key in {collection} on {fields:?}")]
    DuplicateKey {
        collection: String,
        fields: Vec<String>,
    },

    /// A filter could not be built or evaluated.
    #[error("invalid filter: {0}")]
    InvalidFilter(String),

    /// An update operator was applied to a field of the wrong shape.
    #[error("invalid update on {field}: {message}")]
    InvalidUpdate { field: String, message: String },

    /// A document could not be converted to or from its entity type.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The backing store failed.
    #[error("backend error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Whether this error is a unique-index violation.
    #[must_use]
    pub const fn is_duplicate_key(&self) -> bool {
        matches!(self, Self::DuplicateKey { .. })
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateKey { .. } => Self::Conflict(err.to_string()),
            other => Self::Database(other.to_string()),
        }
    }
}
