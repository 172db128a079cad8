//! ID generation utilities.

use ulid::Ulid;

use crate::{AppError, AppResult};

/// ID generator for entities.
#[derive(Debug, Clone, Default)]
pub struct IdGenerator {
    _private: (),
}

impl IdGenerator {
    /// Create a new ID generator.
    #[must_use]
    pub const fn new() -> Self {
        Self { _private: () }
    }

    /// Generate a new ULID-based ID.
    ///
    /// ULIDs are:
    /// - Lexicographically sortable
    /// - Monotonically increasing across milliseconds
    /// - Shorter than UUIDs when represented as strings
    #[must_use]
    pub fn generate(&self) -> String {
        Ulid::new().to_string().to_lowercase()
    }
}

/// Check that `id` is a well-formed entity identifier.
///
/// `label` names the parameter in the error message.
pub fn validate_id(id: &str, label: &str) -> AppResult<()> {
    Ulid::from_string(id)
        .map(|_| ())
        .map_err(|_| AppError::Validation(format!("Invalid {label}: {id:?}")))
}
