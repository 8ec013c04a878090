//! Subscription documents and the normalization invariant.

use std::collections::HashSet;
use std::str::FromStr;

use notify_types::ContentId;
use serde::{Deserialize, Serialize};

/// The ten subscription kinds a user can hold. Mirrors the `events`
/// collection's `kind` string field one for one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionKind {
    AccountUpdated,
    AccountWitnessVoted,
    TransferMade,
    UserMentioned,
    UserFollowChanged,
    StoryPublished,
    StoryVoted,
    CommentPublished,
    CommentVoted,
    DescendantPublished,
}

impl SubscriptionKind {
    /// The wire name used in the `events` collection's `kind` field and in
    /// diagnostic logging — `account.updated`, not `AccountUpdated`.
    pub fn wire_name(self) -> &'static str {
        match self {
            SubscriptionKind::AccountUpdated => "account.updated",
            SubscriptionKind::AccountWitnessVoted => "account.witness_voted",
            SubscriptionKind::TransferMade => "transfer.made",
            SubscriptionKind::UserMentioned => "user.mentioned",
            SubscriptionKind::UserFollowChanged => "user.follow_changed",
            SubscriptionKind::StoryPublished => "story.published",
            SubscriptionKind::StoryVoted => "story.voted",
            SubscriptionKind::CommentPublished => "comment.published",
            SubscriptionKind::CommentVoted => "comment.voted",
            SubscriptionKind::DescendantPublished => "descendant.published",
        }
    }
}

impl FromStr for SubscriptionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "account.updated" => SubscriptionKind::AccountUpdated,
            "account.witness_voted" => SubscriptionKind::AccountWitnessVoted,
            "transfer.made" => SubscriptionKind::TransferMade,
            "user.mentioned" => SubscriptionKind::UserMentioned,
            "user.follow_changed" => SubscriptionKind::UserFollowChanged,
            "story.published" => SubscriptionKind::StoryPublished,
            "story.voted" => SubscriptionKind::StoryVoted,
            "comment.published" => SubscriptionKind::CommentPublished,
            "comment.voted" => SubscriptionKind::CommentVoted,
            "descendant.published" => SubscriptionKind::DescendantPublished,
            other => return Err(format!("unknown subscription kind: {other}")),
        })
    }
}

/// Whether a `descendant.published` selector matches at every depth, or
/// only up to a limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelectorMode {
    Any,
    DepthLimit(u8),
}

/// A single "notify me about descendants of this post" rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selector {
    pub content_id: ContentId,
    pub mode: SelectorMode,
}

impl Selector {
    /// Whether this selector fires for a descendant found at distance `d`
    /// (`d=1` is a direct child).
    pub fn matches_depth(&self, d: u32) -> bool {
        match self.mode {
            SelectorMode::Any => true,
            SelectorMode::DepthLimit(limit) => d <= limit as u32,
        }
    }
}

/// One user's subscription to one kind of event, with the kind-specific
/// attribute sets that gate delivery.
///
/// Every `HashSet<String>` field is normalized on construction
/// ([`normalize`]) rather than trusted from storage — documents can be
/// written by older tooling or hand-edited, and normalization must be
/// idempotent so re-normalizing an already-clean document is a no-op
/// (tested below).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    pub owner_id: String,
    pub kind: SubscriptionKind,

    #[serde(default)]
    pub accounts: HashSet<String>,
    #[serde(default)]
    pub witnesses: HashSet<String>,
    #[serde(default)]
    pub from: HashSet<String>,
    #[serde(default)]
    pub to: HashSet<String>,
    #[serde(default)]
    pub users: HashSet<String>,
    #[serde(default)]
    pub author_blacklist: HashSet<String>,
    #[serde(default)]
    pub tags: HashSet<String>,
    #[serde(default)]
    pub authors: HashSet<String>,
    #[serde(default)]
    pub voters: HashSet<String>,
    #[serde(default)]
    pub parent_authors: HashSet<String>,
    #[serde(default)]
    pub selectors: Vec<Selector>,
}

impl Subscription {
    /// A bare subscription with every attribute set empty, for the caller
    /// to fill in before normalizing.
    pub fn new(owner_id: impl Into<String>, kind: SubscriptionKind) -> Self {
        Self {
            owner_id: owner_id.into(),
            kind,
            accounts: HashSet::new(),
            witnesses: HashSet::new(),
            from: HashSet::new(),
            to: HashSet::new(),
            users: HashSet::new(),
            author_blacklist: HashSet::new(),
            tags: HashSet::new(),
            authors: HashSet::new(),
            voters: HashSet::new(),
            parent_authors: HashSet::new(),
            selectors: Vec::new(),
        }
    }

    /// Normalize every attribute set in place.
    pub fn normalize(&mut self) {
        self.accounts = normalize_set(&self.accounts);
        self.witnesses = normalize_set(&self.witnesses);
        self.from = normalize_set(&self.from);
        self.to = normalize_set(&self.to);
        self.users = normalize_set(&self.users);
        self.author_blacklist = normalize_set(&self.author_blacklist);
        self.tags = normalize_set(&self.tags);
        self.authors = normalize_set(&self.authors);
        self.voters = normalize_set(&self.voters);
        self.parent_authors = normalize_set(&self.parent_authors);
    }
}

/// Trim, strip a leading `@`, drop empties, dedupe preserving first-seen
/// order — the one normalization rule every account-name-shaped attribute
/// set in a subscription document must satisfy.
///
/// Idempotent: `normalize(normalize(xs)) == normalize(xs)`.
pub fn normalize<'a, I: IntoIterator<Item = &'a String>>(values: I) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for value in values {
        let trimmed = value.trim();
        let stripped = trimmed.strip_prefix('@').unwrap_or(trimmed);
        if stripped.is_empty() {
            continue;
        }
        if seen.insert(stripped.to_string()) {
            out.push(stripped.to_string());
        }
    }
    out
}

fn normalize_set(values: &HashSet<String>) -> HashSet<String> {
    normalize(values).into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_trims_strips_at_and_dedupes() {
        let input = vec![
            "  alice".to_string(),
            "@alice".to_string(),
            "@bob ".to_string(),
            "".to_string(),
            "   ".to_string(),
        ];
        assert_eq!(normalize(&input), vec!["alice", "bob"]);
    }

    #[test]
    fn normalize_preserves_first_seen_order() {
        let input = vec!["carol".to_string(), "alice".to_string(), "bob".to_string()];
        assert_eq!(normalize(&input), vec!["carol", "alice", "bob"]);
    }

    #[test]
    fn normalize_is_idempotent() {
        let input = vec!["@alice".to_string(), " bob".to_string()];
        let once = normalize(&input);
        let twice = normalize(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn selector_depth_limit_matches_up_to_and_including_limit() {
        let selector = Selector {
            content_id: ContentId::new("alice", "post"),
            mode: SelectorMode::DepthLimit(2),
        };
        assert!(selector.matches_depth(1));
        assert!(selector.matches_depth(2));
        assert!(!selector.matches_depth(3));
    }

    #[test]
    fn selector_any_matches_every_depth() {
        let selector = Selector {
            content_id: ContentId::new("alice", "post"),
            mode: SelectorMode::Any,
        };
        assert!(selector.matches_depth(1));
        assert!(selector.matches_depth(1_000));
    }

    #[test]
    fn subscription_kind_wire_name_roundtrip() {
        for kind in [
            SubscriptionKind::AccountUpdated,
            SubscriptionKind::DescendantPublished,
            SubscriptionKind::UserMentioned,
        ] {
            assert_eq!(kind.wire_name().parse::<SubscriptionKind>().unwrap(), kind);
        }
    }
}
