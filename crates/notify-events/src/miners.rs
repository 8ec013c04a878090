//! Pure functions that mine [`Event`]s out of a single chain operation.
//!
//! Each miner is total and side-effect free: given the same operation (and,
//! for comment/vote operations, the same fetched `Content`) it always
//! produces the same events. `mine()` runs every miner over the operation
//! and concatenates what they return; an operation irrelevant to a miner
//! contributes nothing, never an error.

use once_cell::sync::Lazy;
use regex::Regex;

use notify_types::{Content, FollowPayload, FollowState, Operation, CUSTOM_JSON_ID_FOLLOW};

use crate::error::ParseError;
use crate::event::Event;

/// `@([a-z0-9-]+)` — a mention is any `@handle` substring in a comment's
/// body. Matches are not deduplicated: the same handle mentioned twice
/// mines two `UserMentioned` events, mirroring the legacy engine.
static MENTION_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"@([a-z0-9\-]+)").unwrap());

/// A single miner function: given an operation and, if the operation
/// refers to content, that content, produce zero or more events. An
/// operation the miner doesn't recognize contributes nothing; an
/// operation it does recognize but can't decode (a malformed
/// `custom_json` payload) is a `ParseError`, not an empty result.
pub type MinerFn = fn(&Operation, Option<&Content>) -> Result<Vec<Event>, ParseError>;

/// The fixed set of miners run over every operation, built once at
/// startup. Order has no observable effect — a block processor runs all
/// of them and merges the results.
pub fn all_miners() -> Vec<MinerFn> {
    vec![
        mine_account_updated,
        mine_account_witness_voted,
        mine_transfer_made,
        mine_user_follow_status_changed,
        mine_story_published,
        mine_story_voted,
        mine_comment_published,
        mine_comment_voted,
        mine_user_mentioned,
    ]
}

/// Run every miner over `op` and concatenate the results. A malformed
/// operation the engine otherwise recognizes (e.g. an undecodable
/// `custom_json` payload) fails the whole call rather than silently
/// contributing no events for that miner.
pub fn mine(op: &Operation, content: Option<&Content>) -> Result<Vec<Event>, ParseError> {
    let mut events = Vec::new();
    for miner in all_miners() {
        events.extend(miner(op, content)?);
    }
    Ok(events)
}

fn mine_account_updated(op: &Operation, _content: Option<&Content>) -> Result<Vec<Event>, ParseError> {
    Ok(match op {
        Operation::AccountUpdate(op) => vec![Event::AccountUpdated {
            account: op.account.clone(),
        }],
        _ => Vec::new(),
    })
}

fn mine_account_witness_voted(op: &Operation, _content: Option<&Content>) -> Result<Vec<Event>, ParseError> {
    Ok(match op {
        Operation::AccountWitnessVote(op) => vec![Event::AccountWitnessVoted {
            account: op.account.clone(),
            witness: op.witness.clone(),
        }],
        _ => Vec::new(),
    })
}

fn mine_transfer_made(op: &Operation, _content: Option<&Content>) -> Result<Vec<Event>, ParseError> {
    Ok(match op {
        Operation::Transfer(op) => vec![Event::TransferMade {
            from: op.from.clone(),
            to: op.to.clone(),
            amount: op.amount.clone(),
        }],
        _ => Vec::new(),
    })
}

fn mine_user_follow_status_changed(op: &Operation, _content: Option<&Content>) -> Result<Vec<Event>, ParseError> {
    let Operation::CustomJson(op) = op else {
        return Ok(Vec::new());
    };
    if op.id != CUSTOM_JSON_ID_FOLLOW {
        return Ok(Vec::new());
    }
    let payload: FollowPayload = serde_json::from_str(&op.json)
        .map_err(|source| ParseError::MalformedCustomJson { id: op.id.clone(), source })?;
    Ok(vec![Event::UserFollowStatusChanged {
        follower: payload.follower,
        following: payload.following,
        what: FollowState::from_what(&payload.what),
    }])
}

fn mine_story_published(op: &Operation, content: Option<&Content>) -> Result<Vec<Event>, ParseError> {
    let Some(content) = content else {
        return Ok(Vec::new());
    };
    if !content.is_story() || !matches!(op, Operation::Comment(_)) {
        return Ok(Vec::new());
    }
    Ok(vec![Event::StoryPublished {
        content: content.clone(),
    }])
}

fn mine_story_voted(op: &Operation, content: Option<&Content>) -> Result<Vec<Event>, ParseError> {
    let Some(content) = content else {
        return Ok(Vec::new());
    };
    let Operation::Vote(vote) = op else {
        return Ok(Vec::new());
    };
    if !content.is_story() {
        return Ok(Vec::new());
    }
    Ok(vec![Event::StoryVoted {
        voter: vote.voter.clone(),
        content: content.clone(),
    }])
}

fn mine_comment_published(op: &Operation, content: Option<&Content>) -> Result<Vec<Event>, ParseError> {
    let Some(content) = content else {
        return Ok(Vec::new());
    };
    if content.is_story() || !matches!(op, Operation::Comment(_)) {
        return Ok(Vec::new());
    }
    Ok(vec![Event::CommentPublished {
        content: content.clone(),
    }])
}

fn mine_comment_voted(op: &Operation, content: Option<&Content>) -> Result<Vec<Event>, ParseError> {
    let Some(content) = content else {
        return Ok(Vec::new());
    };
    let Operation::Vote(vote) = op else {
        return Ok(Vec::new());
    };
    if content.is_story() {
        return Ok(Vec::new());
    }
    Ok(vec![Event::CommentVoted {
        voter: vote.voter.clone(),
        content: content.clone(),
    }])
}

fn mine_user_mentioned(op: &Operation, content: Option<&Content>) -> Result<Vec<Event>, ParseError> {
    let Some(content) = content else {
        return Ok(Vec::new());
    };
    if !matches!(op, Operation::Comment(_)) {
        return Ok(Vec::new());
    }
    Ok(MENTION_RE
        .captures_iter(&content.body)
        .map(|captures| Event::UserMentioned {
            mentioned_user: captures[1].to_string(),
            content: content.clone(),
        })
        .collect())
}
