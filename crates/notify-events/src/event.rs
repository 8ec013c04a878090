//! The event taxonomy mined from chain operations.

use notify_types::{Content, FollowState};
use serde::{Deserialize, Serialize};

/// A single notification-worthy occurrence mined from one operation inside
/// one transaction. One operation can mine zero, one, or several events
/// (e.g. a `comment` mentioning three users mines three `UserMentioned`
/// events plus one `StoryPublished`/`CommentPublished`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    AccountUpdated {
        account: String,
    },
    AccountWitnessVoted {
        account: String,
        witness: String,
    },
    TransferMade {
        from: String,
        to: String,
        amount: String,
    },
    UserMentioned {
        mentioned_user: String,
        content: Content,
    },
    UserFollowStatusChanged {
        follower: String,
        following: String,
        what: FollowState,
    },
    StoryPublished {
        content: Content,
    },
    StoryVoted {
        voter: String,
        content: Content,
    },
    CommentPublished {
        content: Content,
    },
    CommentVoted {
        voter: String,
        content: Content,
    },
}

impl Event {
    /// A stable, lowercase.dotted name for this event's kind, used as the
    /// Prometheus label value and in diagnostic logging. Mirrors the
    /// `SubscriptionKind` wire names in `notify-subscriptions`.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Event::AccountUpdated { .. } => "account.updated",
            Event::AccountWitnessVoted { .. } => "account.witness_voted",
            Event::TransferMade { .. } => "transfer.made",
            Event::UserMentioned { .. } => "user.mentioned",
            Event::UserFollowStatusChanged { .. } => "user.follow_changed",
            Event::StoryPublished { .. } => "story.published",
            Event::StoryVoted { .. } => "story.voted",
            Event::CommentPublished { .. } => "comment.published",
            Event::CommentVoted { .. } => "comment.voted",
        }
    }

    /// The `Content` this event carries, when it carries one. Used by the
    /// `descendant.published` resolver, which matches on content id
    /// regardless of the event's other kind.
    pub fn content(&self) -> Option<&Content> {
        match self {
            Event::UserMentioned { content, .. }
            | Event::StoryPublished { content }
            | Event::StoryVoted { content, .. }
            | Event::CommentPublished { content }
            | Event::CommentVoted { content, .. } => Some(content),
            _ => None,
        }
    }
}
