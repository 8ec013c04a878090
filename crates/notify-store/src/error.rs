//! Errors returned by the document-store port.

use thiserror::Error;

/// Errors raised by a [`crate::DocumentStore`] implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The requested document does not exist.
    #[error("document not found: {0}")]
    NotFound(String),

    /// The underlying storage medium failed (connection, serialization,
    /// disk). Carries no structured detail because adapters wrap wildly
    /// different backends; the message is for operators, not callers.
    #[error("store io error: {0}")]
    Io(String),
}

/// Result type for document-store operations.
pub type StoreResult<T> = Result<T, StoreError>;
