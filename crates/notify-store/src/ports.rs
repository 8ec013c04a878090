//! The document-store port: subscriptions, notifier bindings and the
//! engine's checkpoint, behind one trait so the engine never talks to a
//! concrete backend directly.

use async_trait::async_trait;

use notify_dispatch::{NotifierBinding, NotifierId};
use notify_subscriptions::{Subscription, SubscriptionKind};
use notify_types::Checkpoint;

use crate::error::StoreResult;

/// Persists everything the engine needs across restarts: subscription
/// documents, per-owner notifier bindings, and the block-processor
/// checkpoint. A production deployment backs this with MongoDB (the
/// original's datastore); this workspace ships only `InMemoryStore`,
/// sufficient for tests and local development.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Every subscription document currently on record, used to build a
    /// fresh [`notify_subscriptions::SubscriptionIndex`] at startup and
    /// on reload.
    async fn scan_events(&self) -> StoreResult<Vec<Subscription>>;

    /// Creates or replaces the subscription for `(sub.owner_id, sub.kind)`.
    async fn upsert_event(&self, sub: &Subscription) -> StoreResult<()>;

    /// Removes the subscription for `(owner_id, kind)`, if any.
    async fn delete_event(&self, owner_id: &str, kind: SubscriptionKind) -> StoreResult<()>;

    /// All notifier bindings for `owner_id`, enabled or not — the
    /// dispatch fabric filters by `enabled` itself.
    async fn notifiers_for(&self, owner_id: &str) -> StoreResult<Vec<NotifierBinding>>;

    /// Creates or replaces the binding for `(binding.owner_id, binding.notifier_id)`.
    async fn upsert_notifier(&self, binding: &NotifierBinding) -> StoreResult<()>;

    /// Removes the binding for `(owner_id, notifier_id)`, if any.
    async fn delete_notifier(&self, owner_id: &str, notifier_id: &NotifierId) -> StoreResult<()>;

    /// The last saved checkpoint, or `None` if the engine has never run
    /// against this store before (a fresh deployment starts from
    /// whatever starting block its configuration names).
    async fn load_checkpoint(&self) -> StoreResult<Option<Checkpoint>>;

    /// Persists `checkpoint`, overwriting whatever was saved before.
    async fn save_checkpoint(&self, checkpoint: &Checkpoint) -> StoreResult<()>;
}
