use thiserror::Error;

use crate::domain::repositories::record_store::StoreError;

/// Errors surfaced by the evaluation engine
///
/// Every variant is recoverable from the caller's point of view except
/// `Persistence`, which aborts the current operation without leaving
/// partial state behind.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Validation failed for {field}: {message}")]
    Validation { field: String, message: String },

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Persistence error: {0}")]
    Persistence(String),
}

impl EngineError {
    /// Creates a validation error naming the offending field
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Creates a not-found error for an entity kind and id
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }
}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::PreconditionFailed { collection, id } => EngineError::Conflict(format!(
                "{} record {} was modified concurrently",
                collection, id
            )),
            other => EngineError::Persistence(other.to_string()),
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;

/// Rejects empty or whitespace-only identifiers and names
pub(crate) fn ensure_present(field: &str, value: &str) -> EngineResult<()> {
    if value.trim().is_empty() {
        return Err(EngineError::validation(field, "cannot be empty"));
    }
    Ok(())
}
