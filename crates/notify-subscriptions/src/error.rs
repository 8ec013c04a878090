//! Errors raised while resolving an event against the subscription index.

use notify_chain::ChainError;
use thiserror::Error;

/// Errors raised by [`crate::SubscriptionIndex::resolve`].
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The descendant walk needed a content fetch and it failed. Matches
    /// the legacy engine's behavior of failing the whole block rather than
    /// skipping the walk (see DESIGN.md).
    #[error("descendant walk content fetch failed: {0}")]
    ContentFetch(#[from] ChainError),

    /// A stored `descendant.published` selector carries a malformed
    /// `contentID` that cannot be parsed as `@author/permlink`.
    #[error("invalid selector: {0}")]
    InvalidSelector(String),
}

pub type ResolveResult<T> = Result<T, ResolveError>;
