//! Errors raised by the chain RPC port.

use thiserror::Error;

/// Errors a [`crate::BlockSource`] or [`crate::ContentFetcher`] adapter can
/// raise. The block processor's retry loop only retries `Transient`
/// errors; `Fatal` propagates out and fails the block, and during the
/// descendant walk a content-fetch `Fatal` or `Transient` both fail the
/// block (see `notify-subscriptions::resolve_descendants`).
#[derive(Debug, Error)]
pub enum ChainError {
    /// A condition the retry loop should recover from: a dropped
    /// connection, a timeout, an endpoint returning 5xx.
    #[error("transient chain RPC error: {0}")]
    Transient(String),

    /// A condition retrying cannot fix: malformed RPC response, a content
    /// id that does not exist on chain, or every configured endpoint
    /// exhausted.
    #[error("fatal chain RPC error: {0}")]
    Fatal(String),
}

impl ChainError {
    pub fn is_transient(&self) -> bool {
        matches!(self, ChainError::Transient(_))
    }
}

/// Result type for chain RPC operations.
pub type ChainResult<T> = Result<T, ChainError>;
