//! A `tokio::sync::RwLock`-guarded in-memory [`DocumentStore`]. Good
//! enough for tests and local development; a real deployment backs the
//! port with a persistent store instead (see DESIGN.md).

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use notify_dispatch::{NotifierBinding, NotifierId};
use notify_subscriptions::{Subscription, SubscriptionKind};
use notify_types::Checkpoint;

use crate::error::StoreResult;
use crate::ports::DocumentStore;

type EventKey = (String, SubscriptionKind);
type NotifierKey = (String, NotifierId);

#[derive(Default)]
struct State {
    events: HashMap<EventKey, Subscription>,
    notifiers: HashMap<NotifierKey, NotifierBinding>,
    checkpoint: Option<Checkpoint>,
}

#[derive(Default)]
pub struct InMemoryStore {
    state: RwLock<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn scan_events(&self) -> StoreResult<Vec<Subscription>> {
        Ok(self.state.read().await.events.values().cloned().collect())
    }

    async fn upsert_event(&self, sub: &Subscription) -> StoreResult<()> {
        let mut sub = sub.clone();
        sub.normalize();
        let mut state = self.state.write().await;
        state.events.insert((sub.owner_id.clone(), sub.kind), sub);
        Ok(())
    }

    async fn delete_event(&self, owner_id: &str, kind: SubscriptionKind) -> StoreResult<()> {
        let mut state = self.state.write().await;
        state.events.remove(&(owner_id.to_string(), kind));
        Ok(())
    }

    async fn notifiers_for(&self, owner_id: &str) -> StoreResult<Vec<NotifierBinding>> {
        let state = self.state.read().await;
        Ok(state
            .notifiers
            .values()
            .filter(|b| b.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn upsert_notifier(&self, binding: &NotifierBinding) -> StoreResult<()> {
        let mut state = self.state.write().await;
        state
            .notifiers
            .insert((binding.owner_id.clone(), binding.notifier_id.clone()), binding.clone());
        Ok(())
    }

    async fn delete_notifier(&self, owner_id: &str, notifier_id: &NotifierId) -> StoreResult<()> {
        let mut state = self.state.write().await;
        state.notifiers.remove(&(owner_id.to_string(), notifier_id.clone()));
        Ok(())
    }

    async fn load_checkpoint(&self) -> StoreResult<Option<Checkpoint>> {
        Ok(self.state.read().await.checkpoint)
    }

    async fn save_checkpoint(&self, checkpoint: &Checkpoint) -> StoreResult<()> {
        self.state.write().await.checkpoint = Some(*checkpoint);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify_subscriptions::Subscription;

    #[tokio::test]
    async fn upsert_then_scan_returns_normalized_subscription() {
        let store = InMemoryStore::new();
        let mut sub = Subscription::new("alice", SubscriptionKind::AccountUpdated);
        sub.accounts.insert(" @Bob ".to_string());
        store.upsert_event(&sub).await.unwrap();

        let events = store.scan_events().await.unwrap();
        assert_eq!(events.len(), 1);
        assert!(events[0].accounts.contains("Bob"));
    }

    #[tokio::test]
    async fn delete_event_removes_only_the_matching_kind() {
        let store = InMemoryStore::new();
        store
            .upsert_event(&Subscription::new("alice", SubscriptionKind::AccountUpdated))
            .await
            .unwrap();
        store
            .upsert_event(&Subscription::new("alice", SubscriptionKind::TransferMade))
            .await
            .unwrap();

        store.delete_event("alice", SubscriptionKind::AccountUpdated).await.unwrap();

        let events = store.scan_events().await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, SubscriptionKind::TransferMade);
    }

    #[tokio::test]
    async fn checkpoint_round_trips() {
        let store = InMemoryStore::new();
        assert!(store.load_checkpoint().await.unwrap().is_none());

        let checkpoint = Checkpoint::genesis(42);
        store.save_checkpoint(&checkpoint).await.unwrap();

        assert_eq!(store.load_checkpoint().await.unwrap(), Some(checkpoint));
    }

    #[tokio::test]
    async fn notifiers_for_filters_by_owner() {
        let store = InMemoryStore::new();
        store
            .upsert_notifier(&NotifierBinding {
                owner_id: "alice".into(),
                notifier_id: NotifierId::Webhook,
                enabled: true,
                settings: serde_json::json!({}),
            })
            .await
            .unwrap();
        store
            .upsert_notifier(&NotifierBinding {
                owner_id: "bob".into(),
                notifier_id: NotifierId::Webhook,
                enabled: true,
                settings: serde_json::json!({}),
            })
            .await
            .unwrap();

        let alice_bindings = store.notifiers_for("alice").await.unwrap();
        assert_eq!(alice_bindings.len(), 1);
        assert_eq!(alice_bindings[0].owner_id, "alice");
    }
}
