//! Outbound ports the engine drives: the block stream and content lookup.

use async_trait::async_trait;
use notify_types::{Block, BlockNumber, Content};

use crate::error::ChainError;

/// Delivers irreversible blocks in order, starting from wherever the
/// caller's checkpoint says to resume. Implementations must hide their own
/// reconnection/retry loop — `next_block` either returns a block or a
/// `ChainError`, it never exposes "still retrying" as an intermediate
/// state.
#[async_trait]
pub trait BlockSource: Send + Sync {
    /// The block number this source is about to deliver next. Exposed so
    /// the engine can log/report lag; "to" is always open-ended, the
    /// source blocks until a new irreversible block exists.
    async fn block_range(&self) -> BlockNumber;

    /// Block until the next irreversible block is available, or a fatal
    /// error occurs.
    async fn next_block(&mut self) -> Result<Block, ChainError>;

    /// Queries the chain's current last-irreversible block number via
    /// `get_dynamic_global_properties`. Used once at cold start to pick a
    /// starting point when no checkpoint has been persisted yet.
    async fn last_irreversible_block(&self) -> Result<BlockNumber, ChainError>;
}

/// Fetches a post/comment body by `(author, permlink)`. Every
/// content-bearing operation (`comment`, `vote`) needs exactly one fetch,
/// shared across every miner that runs for that operation.
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    async fn get_content(&self, author: &str, permlink: &str) -> Result<Content, ChainError>;
}
