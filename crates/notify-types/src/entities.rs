//! # Core Chain Entities
//!
//! Defines the chain-domain entities consumed by the notification engine.
//!
//! ## Clusters
//!
//! - **Chain**: `Block`, `Transaction`, `Operation`
//! - **Content**: `Content`, `ContentId`
//! - **Time**: `Timestamp`

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::ParseError;

/// A block height. The chain never produces a block 0 that matters to the
/// engine (genesis is replayed from whatever `nextBlockNum` the checkpoint
/// holds), so this stays a plain newtype rather than a `NonZeroU32`.
pub type BlockNumber = u32;

/// Wall-clock time a block was produced, used only for the checkpoint's
/// `lastBlockTimestamp` diagnostic field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(pub chrono::DateTime<chrono::Utc>);

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

/// `"@author/permlink"` — the canonical address of a post or comment.
///
/// Selectors in `descendant.published` subscriptions are expressed as a
/// `contentID` in this shape (extracted from a user-provided URL upstream,
/// outside the engine).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentId {
    pub author: String,
    pub permlink: String,
}

impl ContentId {
    pub fn new(author: impl Into<String>, permlink: impl Into<String>) -> Self {
        Self {
            author: author.into(),
            permlink: permlink.into(),
        }
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}/{}", self.author, self.permlink)
    }
}

impl FromStr for ContentId {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rest = s.strip_prefix('@').unwrap_or(s);
        match rest.split_once('/') {
            Some((author, permlink)) if !author.is_empty() && !permlink.is_empty() => {
                Ok(ContentId::new(author, permlink))
            }
            _ => Err(ParseError::InvalidContentId(s.to_string())),
        }
    }
}

/// The canonical post/comment object fetched from the chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content {
    pub author: String,
    pub permlink: String,
    pub parent_author: String,
    pub parent_permlink: String,
    pub body: String,
    pub url: String,
    pub title: String,
    pub tags: Vec<String>,
    pub pending_payout_value: String,
    pub total_payout_value: String,
}

impl Content {
    /// A story is a content with no parent.
    pub fn is_story(&self) -> bool {
        self.parent_author.is_empty()
    }

    pub fn id(&self) -> ContentId {
        ContentId::new(self.author.clone(), self.permlink.clone())
    }

    pub fn parent_id(&self) -> Option<ContentId> {
        if self.is_story() {
            None
        } else {
            Some(ContentId::new(
                self.parent_author.clone(),
                self.parent_permlink.clone(),
            ))
        }
    }
}

/// `comment` operation payload. Mined into `StoryPublished`/`CommentPublished`
/// (and scanned for `UserMentioned`) once its `Content` has been fetched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentOperation {
    pub author: String,
    pub permlink: String,
    pub parent_author: String,
    pub parent_permlink: String,
}

/// `vote` operation payload. Mined into `StoryVoted`/`CommentVoted`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoteOperation {
    pub voter: String,
    pub author: String,
    pub permlink: String,
    pub weight: i16,
}

/// `transfer` operation payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferOperation {
    pub from: String,
    pub to: String,
    pub amount: String,
    pub memo: String,
}

/// `account_update` operation payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountUpdateOperation {
    pub account: String,
}

/// `account_witness_vote` operation payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountWitnessVoteOperation {
    pub account: String,
    pub witness: String,
    pub approve: bool,
}

/// The `custom_json` id this engine recognizes. Any other id is carried
/// through as `Operation::Other` and ignored by every miner.
pub const CUSTOM_JSON_ID_FOLLOW: &str = "follow";

/// `custom_json` operation payload, before its `json` body has been decoded
/// against a known schema (only `id == "follow"` is decoded further, by the
/// `UserFollowStatusChanged` miner).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomJsonOperation {
    pub id: String,
    pub json: String,
    pub required_posting_auths: Vec<String>,
}

/// The inner payload of a `custom_json[follow]` operation, after JSON
/// decoding. Mirrors the `["follow", {...}]` two-element array the chain
/// actually encodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FollowPayload {
    pub follower: String,
    pub following: String,
    pub what: Vec<String>,
}

/// The three mutually exclusive follow states a `follow` custom_json can
/// express, collapsed from the upstream `what: Vec<String>` (length 0 or 1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FollowState {
    Followed,
    Muted,
    Reset,
}

impl FollowState {
    pub fn from_what(what: &[String]) -> Self {
        match what {
            [single] if single == "blog" => FollowState::Followed,
            [single] if single == "ignore" => FollowState::Muted,
            _ => FollowState::Reset,
        }
    }
}

/// A tagged variant over the chain operation kinds the engine mines events
/// from. Unrecognized operations decode to `Other` rather than failing —
/// the engine only ever needs to recognize a small, fixed set of kinds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Operation {
    Comment(CommentOperation),
    Vote(VoteOperation),
    Transfer(TransferOperation),
    AccountUpdate(AccountUpdateOperation),
    AccountWitnessVote(AccountWitnessVoteOperation),
    CustomJson(CustomJsonOperation),
    /// Any operation kind the engine does not mine events from.
    Other { id: String },
}

impl Operation {
    /// Whether this op carries an `(author, permlink)` pair that requires a
    /// content fetch before mining can proceed.
    pub fn content_ref(&self) -> Option<(&str, &str)> {
        match self {
            Operation::Comment(op) => Some((op.author.as_str(), op.permlink.as_str())),
            Operation::Vote(op) => Some((op.author.as_str(), op.permlink.as_str())),
            _ => None,
        }
    }
}

/// One chain transaction, a sequence of operations applied atomically.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub operations: Vec<Operation>,
}

/// An irreversible chain block, as delivered by the block source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    pub number: BlockNumber,
    pub timestamp: Timestamp,
    pub transactions: Vec<Transaction>,
}

/// The document id the checkpoint is always stored under. There is only
/// ever one checkpoint in the whole engine.
pub const CHECKPOINT_DOCUMENT_ID: &str = "BlockProcessor";

/// The block processor's durable position: the next block to fetch, and
/// the timestamp of the last block actually processed (a diagnostic field
/// only, never used to decide what to fetch next).
///
/// Defined here rather than in `notify-store` or `notify-engine` because
/// both the store port (which persists it) and the engine (which advances
/// it) need the type, and neither should depend on the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub next_block_num: BlockNumber,
    pub last_block_timestamp: Option<Timestamp>,
}

impl Checkpoint {
    pub fn genesis(starting_block: BlockNumber) -> Self {
        Self {
            next_block_num: starting_block,
            last_block_timestamp: None,
        }
    }

    /// Advance the checkpoint past a just-processed block.
    pub fn advance_past(&self, block: &Block) -> Self {
        Self {
            next_block_num: block.number + 1,
            last_block_timestamp: Some(block.timestamp),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn content(parent_author: &str) -> Content {
        Content {
            author: "alice".into(),
            permlink: "post".into(),
            parent_author: parent_author.into(),
            parent_permlink: String::new(),
            body: String::new(),
            url: String::new(),
            title: String::new(),
            tags: vec![],
            pending_payout_value: "0.000 SBD".into(),
            total_payout_value: "0.000 SBD".into(),
        }
    }

    #[test]
    fn is_story_when_no_parent() {
        assert!(content("").is_story());
        assert!(!content("bob").is_story());
    }

    #[test]
    fn content_id_display_and_parse_roundtrip() {
        let id = ContentId::new("root", "post");
        assert_eq!(id.to_string(), "@root/post");
        assert_eq!("@root/post".parse::<ContentId>().unwrap(), id);
        assert_eq!("root/post".parse::<ContentId>().unwrap(), id);
    }

    #[test]
    fn content_id_rejects_malformed_input() {
        assert!("not-a-content-id".parse::<ContentId>().is_err());
        assert!("@/permlink".parse::<ContentId>().is_err());
    }

    #[test]
    fn follow_state_from_what() {
        assert_eq!(
            FollowState::from_what(&["blog".to_string()]),
            FollowState::Followed
        );
        assert_eq!(
            FollowState::from_what(&["ignore".to_string()]),
            FollowState::Muted
        );
        assert_eq!(FollowState::from_what(&[]), FollowState::Reset);
    }

    #[test]
    fn checkpoint_advance_past_sets_next_block_and_timestamp() {
        let genesis = Checkpoint::genesis(100);
        assert_eq!(genesis.next_block_num, 100);
        assert_eq!(genesis.last_block_timestamp, None);

        let block = Block {
            number: 100,
            timestamp: Timestamp(chrono::Utc::now()),
            transactions: vec![],
        };
        let advanced = genesis.advance_past(&block);
        assert_eq!(advanced.next_block_num, 101);
        assert_eq!(advanced.last_block_timestamp, Some(block.timestamp));
    }
}
