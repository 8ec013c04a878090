//! The inverted-index subscription resolver.
//!
//! Built by a single linear scan of every stored [`Subscription`] (mirrors
//! the legacy engine's `buildDB` in `notifications/db.go`, which populated
//! one in-memory QL table per kind from the same scan). This engine skips
//! the embedded SQL engine entirely — a handful of `HashMap<String,
//! HashSet<OwnerId>>` covers the same OR-of-attribute-lookups query shape
//! without a query planner nobody here needs (see DESIGN.md, "Dual
//! storage").

use std::collections::{HashMap, HashSet};

use notify_chain::ContentFetcher;
use notify_events::Event;
use notify_types::ContentId;

use crate::domain::{Selector, Subscription, SubscriptionKind};
use crate::error::ResolveResult;

/// A user id, as stored in `Subscription::owner_id`. Kept as a bare
/// `String` alias rather than a newtype — every subscription-facing port
/// in this crate already treats it as an opaque string key.
pub type OwnerId = String;

/// How far the descendant-of-post walk is allowed to climb before giving
/// up, independent of any subscriber's own `depthLimit`. Prevents a
/// pathological (or malicious) ancestor chain from looping the walk
/// forever.
pub const DEFAULT_DESCENDANT_WALK_MAX_DEPTH: u32 = 256;

/// The built inverted index. Immutable once constructed — a reload builds
/// a fresh instance from a fresh scan and the caller swaps it in, rather
/// than mutating this one in place (spec §4.3.2).
#[derive(Debug, Default)]
pub struct SubscriptionIndex {
    account_updated_accounts: HashMap<String, HashSet<OwnerId>>,

    account_witness_voted_accounts: HashMap<String, HashSet<OwnerId>>,
    account_witness_voted_witnesses: HashMap<String, HashSet<OwnerId>>,

    transfer_made_from: HashMap<String, HashSet<OwnerId>>,
    transfer_made_to: HashMap<String, HashSet<OwnerId>>,

    user_mentioned_users: HashMap<String, HashSet<OwnerId>>,
    user_mentioned_blacklists: HashMap<OwnerId, HashSet<String>>,

    user_follow_changed_users: HashMap<String, HashSet<OwnerId>>,

    story_published_authors: HashMap<String, HashSet<OwnerId>>,
    story_published_tags: HashMap<String, HashSet<OwnerId>>,

    story_voted_authors: HashMap<String, HashSet<OwnerId>>,
    story_voted_voters: HashMap<String, HashSet<OwnerId>>,

    comment_published_authors: HashMap<String, HashSet<OwnerId>>,
    comment_published_parent_authors: HashMap<String, HashSet<OwnerId>>,

    comment_voted_authors: HashMap<String, HashSet<OwnerId>>,
    comment_voted_voters: HashMap<String, HashSet<OwnerId>>,

    descendant_selectors: HashMap<ContentId, Vec<(OwnerId, Selector)>>,

    descendant_walk_max_depth: u32,
    owner_count: usize,
}

impl SubscriptionIndex {
    /// Scan `subscriptions` once and build every inverted map. Each
    /// `Subscription` is expected to already be normalized (callers that
    /// read straight from a `DocumentStore` get this for free since the
    /// store adapter normalizes on write).
    pub fn build(subscriptions: Vec<Subscription>) -> Self {
        Self::build_with_depth(subscriptions, DEFAULT_DESCENDANT_WALK_MAX_DEPTH)
    }

    pub fn build_with_depth(subscriptions: Vec<Subscription>, descendant_walk_max_depth: u32) -> Self {
        let mut index = SubscriptionIndex {
            descendant_walk_max_depth,
            ..Default::default()
        };

        let mut owners = HashSet::new();

        for sub in subscriptions {
            owners.insert(sub.owner_id.clone());
            match sub.kind {
                SubscriptionKind::AccountUpdated => {
                    insert_all(&mut index.account_updated_accounts, &sub.accounts, &sub.owner_id);
                }
                SubscriptionKind::AccountWitnessVoted => {
                    insert_all(
                        &mut index.account_witness_voted_accounts,
                        &sub.accounts,
                        &sub.owner_id,
                    );
                    insert_all(
                        &mut index.account_witness_voted_witnesses,
                        &sub.witnesses,
                        &sub.owner_id,
                    );
                }
                SubscriptionKind::TransferMade => {
                    insert_all(&mut index.transfer_made_from, &sub.from, &sub.owner_id);
                    insert_all(&mut index.transfer_made_to, &sub.to, &sub.owner_id);
                }
                SubscriptionKind::UserMentioned => {
                    insert_all(&mut index.user_mentioned_users, &sub.users, &sub.owner_id);
                    index
                        .user_mentioned_blacklists
                        .insert(sub.owner_id.clone(), sub.author_blacklist.clone());
                }
                SubscriptionKind::UserFollowChanged => {
                    insert_all(&mut index.user_follow_changed_users, &sub.users, &sub.owner_id);
                }
                SubscriptionKind::StoryPublished => {
                    insert_all(&mut index.story_published_authors, &sub.authors, &sub.owner_id);
                    insert_all(&mut index.story_published_tags, &sub.tags, &sub.owner_id);
                }
                SubscriptionKind::StoryVoted => {
                    insert_all(&mut index.story_voted_authors, &sub.authors, &sub.owner_id);
                    insert_all(&mut index.story_voted_voters, &sub.voters, &sub.owner_id);
                }
                SubscriptionKind::CommentPublished => {
                    insert_all(&mut index.comment_published_authors, &sub.authors, &sub.owner_id);
                    insert_all(
                        &mut index.comment_published_parent_authors,
                        &sub.parent_authors,
                        &sub.owner_id,
                    );
                }
                SubscriptionKind::CommentVoted => {
                    insert_all(&mut index.comment_voted_authors, &sub.authors, &sub.owner_id);
                    insert_all(&mut index.comment_voted_voters, &sub.voters, &sub.owner_id);
                }
                SubscriptionKind::DescendantPublished => {
                    for selector in &sub.selectors {
                        index
                            .descendant_selectors
                            .entry(selector.content_id.clone())
                            .or_default()
                            .push((sub.owner_id.clone(), selector.clone()));
                    }
                }
            }
        }

        index.owner_count = owners.len();
        index
    }

    /// Distinct owner ids present in the index, for the
    /// `notify_subscription_index_owners` gauge.
    pub fn owner_count(&self) -> usize {
        self.owner_count
    }

    /// Resolve the set of owners who should be notified of `event`.
    pub async fn resolve(
        &self,
        event: &Event,
        content_fetcher: &dyn ContentFetcher,
    ) -> ResolveResult<HashSet<OwnerId>> {
        let resolved = match event {
            Event::AccountUpdated { account } => {
                lookup(&self.account_updated_accounts, account)
            }
            Event::AccountWitnessVoted { account, witness } => union(
                lookup(&self.account_witness_voted_accounts, account),
                lookup(&self.account_witness_voted_witnesses, witness),
            ),
            Event::TransferMade { from, to, .. } => union(
                lookup(&self.transfer_made_from, from),
                lookup(&self.transfer_made_to, to),
            ),
            Event::UserMentioned {
                mentioned_user,
                content,
            } => {
                let mut owners = lookup(&self.user_mentioned_users, mentioned_user);
                owners.retain(|owner| {
                    !self
                        .user_mentioned_blacklists
                        .get(owner)
                        .is_some_and(|blacklist| blacklist.contains(&content.author))
                });
                owners
            }
            Event::UserFollowStatusChanged { following, .. } => {
                lookup(&self.user_follow_changed_users, following)
            }
            Event::StoryPublished { content } => {
                let mut owners = lookup(&self.story_published_authors, &content.author);
                for tag in &content.tags {
                    owners.extend(lookup(&self.story_published_tags, tag));
                }
                owners
            }
            Event::StoryVoted { voter, content } => union(
                lookup(&self.story_voted_authors, &content.author),
                lookup(&self.story_voted_voters, voter),
            ),
            Event::CommentPublished { content } => {
                let mut owners = union(
                    lookup(&self.comment_published_authors, &content.author),
                    lookup(
                        &self.comment_published_parent_authors,
                        &content.parent_author,
                    ),
                );
                owners.extend(self.resolve_descendants(content, content_fetcher).await?);
                owners
            }
            Event::CommentVoted { voter, content } => union(
                lookup(&self.comment_voted_authors, &content.author),
                lookup(&self.comment_voted_voters, voter),
            ),
        };
        Ok(resolved)
    }

    /// Walk up the ancestor chain of a just-published comment, matching
    /// `descendant.published` selectors at each step. Stops at the first
    /// story ancestor, or at `descendant_walk_max_depth`, whichever comes
    /// first.
    ///
    /// A content-fetch error while climbing fails the whole walk (and so
    /// the caller's block) rather than silently truncating it — this
    /// matches the legacy engine, which had no equivalent safeguard and
    /// simply propagated the fetch error (see DESIGN.md).
    async fn resolve_descendants(
        &self,
        published: &notify_types::Content,
        content_fetcher: &dyn ContentFetcher,
    ) -> ResolveResult<HashSet<OwnerId>> {
        let mut owners = HashSet::new();

        if published.is_story() {
            return Ok(owners);
        }

        let mut cursor_author = published.parent_author.clone();
        let mut cursor_permlink = published.parent_permlink.clone();
        let mut depth: u32 = 1;

        loop {
            if depth > self.descendant_walk_max_depth {
                break;
            }

            let cursor_id = ContentId::new(cursor_author.clone(), cursor_permlink.clone());
            if let Some(selectors) = self.descendant_selectors.get(&cursor_id) {
                for (owner, selector) in selectors {
                    if selector.matches_depth(depth) {
                        owners.insert(owner.clone());
                    }
                }
            }

            let cursor_content = content_fetcher
                .get_content(&cursor_author, &cursor_permlink)
                .await?;

            if cursor_content.is_story() {
                break;
            }

            cursor_author = cursor_content.parent_author.clone();
            cursor_permlink = cursor_content.parent_permlink.clone();
            depth += 1;
        }

        Ok(owners)
    }
}

fn insert_all(map: &mut HashMap<String, HashSet<OwnerId>>, values: &HashSet<String>, owner: &str) {
    for value in values {
        map.entry(value.clone()).or_default().insert(owner.to_string());
    }
}

fn lookup(map: &HashMap<String, HashSet<OwnerId>>, key: &str) -> HashSet<OwnerId> {
    map.get(key).cloned().unwrap_or_default()
}

fn union(mut a: HashSet<OwnerId>, b: HashSet<OwnerId>) -> HashSet<OwnerId> {
    a.extend(b);
    a
}
