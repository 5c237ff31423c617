use thiserror::Error;

/// Errors that can occur in the document store layer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Reading the document failed before any content was received.
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// Content was received but could not be decoded into a `Document`.
    #[error("Decode error: {0}")]
    Decode(String),

    /// The version precondition of a write did not hold.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Writing the document failed for a reason other than a stale version.
    #[error("Write error: {0}")]
    Write(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl StoreError {
    /// Whether this error is the recoverable reload-and-reconcile case.
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict(_))
    }
}
