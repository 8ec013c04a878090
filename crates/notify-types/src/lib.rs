//! # Notify Types
//!
//! Chain-domain primitives shared across the notification engine.
//!
//! ## Clusters
//!
//! - **Chain**: `Block`, `Transaction`, `Operation`
//! - **Content**: `Content`, `ContentId`
//! - **Time**: `Timestamp`

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod entities;
pub mod errors;

pub use entities::{
    AccountUpdateOperation, AccountWitnessVoteOperation, Block, BlockNumber, Checkpoint,
    CommentOperation, Content, ContentId, CustomJsonOperation, FollowPayload, FollowState,
    Operation, Timestamp, Transaction, TransferOperation, VoteOperation, CHECKPOINT_DOCUMENT_ID,
    CUSTOM_JSON_ID_FOLLOW,
};
pub use errors::ParseError;
