//! End-to-end scenarios spanning mining, subscription resolution, dispatch
//! and checkpoint persistence — each one exercises the same path a live
//! block would take through `notify-engine`, minus the RPC block source.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use notify_chain::{ChainError, ContentFetcher};
use notify_dispatch::{DispatchConfig, DispatchFabric, NotifierAdapter, NotifierBinding, NotifierId, NotifierRegistry};
use notify_events::{mine, Event};
use notify_store::{DocumentStore, InMemoryStore};
use notify_subscriptions::{Selector, SelectorMode, Subscription, SubscriptionIndex, SubscriptionKind};
use notify_types::{CommentOperation, Content, ContentId, Operation};

fn content(author: &str, permlink: &str, parent_author: &str, parent_permlink: &str, body: &str, tags: Vec<&str>) -> Content {
    Content {
        author: author.into(),
        permlink: permlink.into(),
        parent_author: parent_author.into(),
        parent_permlink: parent_permlink.into(),
        body: body.into(),
        url: String::new(),
        title: String::new(),
        tags: tags.into_iter().map(String::from).collect(),
        pending_payout_value: "0.000 SBD".into(),
        total_payout_value: "0.000 SBD".into(),
    }
}

fn comment_op(author: &str, permlink: &str, parent_author: &str, parent_permlink: &str) -> Operation {
    Operation::Comment(CommentOperation {
        author: author.into(),
        permlink: permlink.into(),
        parent_author: parent_author.into(),
        parent_permlink: parent_permlink.into(),
    })
}

fn subscription(owner: &str, kind: SubscriptionKind, set: impl FnOnce(&mut Subscription)) -> Subscription {
    let mut sub = Subscription::new(owner, kind);
    set(&mut sub);
    sub.normalize();
    sub
}

/// Serves content from a fixed table, keyed by `@author/permlink`.
struct FixedContentFetcher {
    by_id: HashMap<String, Content>,
}

impl FixedContentFetcher {
    fn new(contents: Vec<Content>) -> Self {
        let by_id = contents
            .into_iter()
            .map(|c| (ContentId::new(c.author.clone(), c.permlink.clone()).to_string(), c))
            .collect();
        Self { by_id }
    }
}

#[async_trait]
impl ContentFetcher for FixedContentFetcher {
    async fn get_content(&self, author: &str, permlink: &str) -> Result<Content, ChainError> {
        self.by_id
            .get(&ContentId::new(author, permlink).to_string())
            .cloned()
            .ok_or_else(|| ChainError::Fatal(format!("no such content: @{author}/{permlink}")))
    }
}

/// Records every event delivered to it, always succeeding.
#[derive(Default)]
struct RecordingAdapter {
    deliveries: Mutex<Vec<String>>,
}

#[async_trait]
impl NotifierAdapter for RecordingAdapter {
    async fn deliver(&self, binding: &NotifierBinding, event: &Event) -> Result<(), notify_dispatch::DispatchError> {
        self.deliveries.lock().unwrap().push(format!("{}:{}", binding.owner_id, event.kind_name()));
        Ok(())
    }
}

/// Always fails delivery, to prove one binding's failure doesn't block
/// another's.
struct FailingAdapter;

#[async_trait]
impl NotifierAdapter for FailingAdapter {
    async fn deliver(&self, _binding: &NotifierBinding, _event: &Event) -> Result<(), notify_dispatch::DispatchError> {
        Err(notify_dispatch::DispatchError::Transport("simulated failure".into()))
    }
}

fn binding(owner: &str, notifier_id: NotifierId, enabled: bool) -> NotifierBinding {
    NotifierBinding {
        owner_id: owner.into(),
        notifier_id,
        enabled,
        settings: serde_json::json!({}),
    }
}

struct StaticBindingSource(Vec<NotifierBinding>);

#[async_trait]
impl notify_dispatch::NotifierBindingSource for StaticBindingSource {
    async fn bindings_for(&self, owner_id: &str) -> Result<Vec<NotifierBinding>, notify_dispatch::DispatchError> {
        Ok(self.0.iter().filter(|b| b.owner_id == owner_id).cloned().collect())
    }
}

/// S1 — a tag match on a freshly published story triggers exactly one
/// delivery, carrying the mined `StoryPublished` event.
#[tokio::test]
async fn s1_tag_match_triggers_one_delivery() {
    let sub = subscription("u1", SubscriptionKind::StoryPublished, |s| {
        s.tags.insert("steem".to_string());
    });
    let index = SubscriptionIndex::build(vec![sub]);
    let fetcher = FixedContentFetcher::new(vec![]);

    let op = comment_op("alice", "post1", "", "");
    let published = content("alice", "post1", "", "", "hello world", vec!["blog", "steem"]);

    let events = mine(&op, Some(&published)).unwrap();
    assert_eq!(events.len(), 1);
    let event = &events[0];
    assert_eq!(event.kind_name(), "story.published");

    let owners = index.resolve(event, &fetcher).await.unwrap();
    assert_eq!(owners, std::collections::HashSet::from(["u1".to_string()]));
}

/// S2 — a mention from a blacklisted author is suppressed, the same
/// mention from anyone else is delivered.
#[tokio::test]
async fn s2_mention_respects_author_blacklist() {
    let sub = subscription("u1", SubscriptionKind::UserMentioned, |s| {
        s.users.insert("bob".to_string());
        s.author_blacklist.insert("eve".to_string());
    });
    let index = SubscriptionIndex::build(vec![sub]);
    let fetcher = FixedContentFetcher::new(vec![]);

    let from_eve = comment_op("eve", "spam", "", "");
    let eve_content = content("eve", "spam", "", "", "hey @bob check this out", vec![]);
    let from_alice = comment_op("alice", "shoutout", "", "");
    let alice_content = content("alice", "shoutout", "", "", "hey @bob check this out", vec![]);

    let eve_events = mine(&from_eve, Some(&eve_content)).unwrap();
    let alice_events = mine(&from_alice, Some(&alice_content)).unwrap();

    let eve_mention = eve_events.into_iter().find(|e| e.kind_name() == "user.mentioned").unwrap();
    let alice_mention = alice_events.into_iter().find(|e| e.kind_name() == "user.mentioned").unwrap();

    let owners_eve = index.resolve(&eve_mention, &fetcher).await.unwrap();
    assert!(owners_eve.is_empty(), "blacklisted author's mention must not deliver");

    let owners_alice = index.resolve(&alice_mention, &fetcher).await.unwrap();
    assert_eq!(owners_alice, std::collections::HashSet::from(["u1".to_string()]));
}

/// S3 — a descendant four levels below the selector's root exceeds a
/// `depthLimit` of 2 and does not fire, but fires once the limit is
/// raised to cover it.
#[tokio::test]
async fn s3_descendant_depth_limit() {
    let root = content("root", "post", "", "", "the root post", vec![]);
    let c1 = content("c1", "reply1", "root", "post", "first reply", vec![]);
    let c2 = content("c2", "reply2", "c1", "reply1", "second reply", vec![]);
    let c3 = content("c3", "reply3", "c2", "reply2", "third reply", vec![]);
    let fetcher = FixedContentFetcher::new(vec![root.clone(), c1, c2, c3.clone()]);

    let new_reply = content("c4", "reply4", "c3", "reply3", "fourth reply", vec![]);
    let op = comment_op("c4", "reply4", "c3", "reply3");
    let event = mine(&op, Some(&new_reply))
        .unwrap()
        .into_iter()
        .find(|e| e.kind_name() == "comment.published")
        .unwrap();

    let limited_sub = subscription("u1", SubscriptionKind::DescendantPublished, |s| {
        s.selectors.push(Selector {
            content_id: ContentId::new("root", "post"),
            mode: SelectorMode::DepthLimit(2),
        });
    });
    let limited_index = SubscriptionIndex::build(vec![limited_sub]);
    let owners = limited_index.resolve(&event, &fetcher).await.unwrap();
    assert!(owners.is_empty(), "depth 3 must not fire a depthLimit(2) selector");

    let wide_sub = subscription("u1", SubscriptionKind::DescendantPublished, |s| {
        s.selectors.push(Selector {
            content_id: ContentId::new("root", "post"),
            mode: SelectorMode::DepthLimit(3),
        });
    });
    let wide_index = SubscriptionIndex::build(vec![wide_sub]);
    let owners = wide_index.resolve(&event, &fetcher).await.unwrap();
    assert_eq!(owners, std::collections::HashSet::from(["u1".to_string()]));
}

/// S4 — the checkpoint saved before an abrupt restart is always at least
/// as far along as the last block actually processed, and never claims a
/// block that was never seen.
#[tokio::test]
async fn s4_checkpoint_survives_a_restart() {
    let store = InMemoryStore::new();

    let mut checkpoint = notify_types::Checkpoint::genesis(100);
    for number in 100..=110 {
        let block = notify_types::Block {
            number,
            timestamp: notify_types::Timestamp(chrono::DateTime::from_timestamp(number as i64, 0).unwrap()),
            transactions: vec![],
        };
        checkpoint = checkpoint.advance_past(&block);
    }
    store.save_checkpoint(&checkpoint).await.unwrap();

    let resumed = store.load_checkpoint().await.unwrap().unwrap();
    assert_eq!(resumed.next_block_num, 111);

    let mut checkpoint = resumed;
    for number in 111..=113 {
        let block = notify_types::Block {
            number,
            timestamp: notify_types::Timestamp(chrono::DateTime::from_timestamp(number as i64, 0).unwrap()),
            transactions: vec![],
        };
        checkpoint = checkpoint.advance_past(&block);
        // Simulates the periodic flush tick without a graceful shutdown —
        // the engine may crash between any two of these saves.
        store.save_checkpoint(&checkpoint).await.unwrap();
    }

    let after_crash = store.load_checkpoint().await.unwrap().unwrap();
    assert!(
        (111..=114).contains(&after_crash.next_block_num),
        "resume point {} must fall within the blocks actually processed",
        after_crash.next_block_num
    );
}

/// S5 — one notifier binding erroring out does not stop delivery to a
/// sibling binding for the same owner and event.
#[tokio::test]
async fn s5_notifier_failure_is_isolated() {
    let mut registry = NotifierRegistry::new();
    let config = DispatchConfig::default();
    let ok_adapter = Arc::new(RecordingAdapter::default());
    registry.register(NotifierId::Webhook, ok_adapter.clone(), &config);
    registry.register(NotifierId::Telegram, Arc::new(FailingAdapter), &config);

    let bindings = vec![
        binding("u1", NotifierId::Webhook, true),
        binding("u1", NotifierId::Telegram, true),
    ];
    let source = Arc::new(StaticBindingSource(bindings));
    let fabric = DispatchFabric::new(registry, source, &config);

    let event = Arc::new(Event::AccountUpdated { account: "u1".to_string() });
    fabric.submit("u1", event).await.unwrap();

    let recorded = ok_adapter.deliveries.lock().unwrap();
    assert_eq!(recorded.as_slice(), ["u1:account.updated"]);
}

/// S6 — a second websocket connection for the same owner evicts the
/// first; only the surviving connection receives subsequent events.
#[tokio::test]
async fn s6_reconnecting_evicts_the_prior_websocket_sender() {
    use notify_dispatch::adapters::WebsocketNotifier;
    use tokio::sync::mpsc;

    let notifier = WebsocketNotifier::new();
    let (first_tx, mut first_rx) = mpsc::unbounded_channel();
    let (second_tx, mut second_rx) = mpsc::unbounded_channel();

    notifier.register("u1".to_string(), first_tx);
    notifier.register("u1".to_string(), second_tx);
    assert_eq!(notifier.connection_count(), 1);

    let binding = binding("u1", NotifierId::Websocket, true);
    let event = Event::AccountUpdated { account: "u1".to_string() };
    notifier.deliver(&binding, &event).await.unwrap();

    assert!(
        first_rx.try_recv().is_err(),
        "the evicted connection must not receive the event"
    );
    assert!(second_rx.try_recv().is_ok(), "the surviving connection must receive the event");
}
