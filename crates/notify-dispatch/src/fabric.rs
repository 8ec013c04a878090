//! The dispatch fabric: resolves an owner's notifier bindings (cached),
//! then fans an event out to every enabled binding concurrently, bounded
//! per-adapter by the registry's semaphores.

use std::sync::Arc;

use async_trait::async_trait;
use moka::future::Cache;
use tracing::{debug, warn};

use crate::domain::{DispatchConfig, NotifierBinding, NotifierId};
use crate::error::DispatchError;
use crate::registry::NotifierRegistry;
use notify_events::Event;

/// Fetches the notifier bindings for one owner. Implemented by
/// `notify-engine` over the concrete document store — kept as a local
/// trait here (rather than depending on `notify-store` directly) so this
/// crate doesn't import the crate that depends on it (see DESIGN.md).
#[async_trait]
pub trait NotifierBindingSource: Send + Sync {
    async fn bindings_for(&self, owner_id: &str) -> Result<Vec<NotifierBinding>, DispatchError>;
}

/// Resolves owners to notifiers and delivers events to them.
pub struct DispatchFabric {
    registry: NotifierRegistry,
    source: Arc<dyn NotifierBindingSource>,
    cache: Cache<String, Arc<Vec<NotifierBinding>>>,
}

impl DispatchFabric {
    pub fn new(
        registry: NotifierRegistry,
        source: Arc<dyn NotifierBindingSource>,
        config: &DispatchConfig,
    ) -> Self {
        let cache = Cache::builder()
            .time_to_live(config.binding_cache_ttl)
            .build();
        Self { registry, source, cache }
    }

    async fn bindings_for(&self, owner_id: &str) -> Result<Arc<Vec<NotifierBinding>>, DispatchError> {
        if let Some(cached) = self.cache.get(owner_id).await {
            return Ok(cached);
        }
        let fetched = Arc::new(self.source.bindings_for(owner_id).await?);
        self.cache.insert(owner_id.to_string(), fetched.clone()).await;
        Ok(fetched)
    }

    /// Invalidates a single owner's cached bindings. Called when a
    /// binding is created, updated or deleted, so a change takes effect
    /// sooner than `binding_cache_ttl` would otherwise allow.
    pub async fn invalidate(&self, owner_id: &str) {
        self.cache.invalidate(owner_id).await;
    }

    /// Delivers `event` to every enabled notifier binding of `owner_id`,
    /// plus, unconditionally, to every adapter registered as a broadcast
    /// notifier (one with no per-owner settings, e.g. the websocket
    /// fan-out notifier) — those run regardless of whether `owner_id` has
    /// an explicit binding row. One adapter's failure doesn't stop
    /// delivery to the others; every outcome is logged and the caller
    /// only learns whether at least one delivery attempt could not even
    /// be dispatched (unknown notifier).
    pub async fn submit(&self, owner_id: &str, event: Arc<Event>) -> Result<(), DispatchError> {
        let bindings = self.bindings_for(owner_id).await?;

        let named = bindings
            .iter()
            .filter(|b| b.enabled)
            .map(|binding| self.deliver_one(binding, event.clone()));

        let broadcasts = self.registry.broadcast_entries().map(|(name, adapter, semaphore)| {
            self.deliver_broadcast(owner_id, name, adapter, semaphore, event.clone())
        });

        futures::join!(futures::future::join_all(named), futures::future::join_all(broadcasts));
        Ok(())
    }

    async fn deliver_one(&self, binding: &NotifierBinding, event: Arc<Event>) {
        let Some((adapter, semaphore)) = self.registry.get(&binding.notifier_id) else {
            warn!(notifier = %binding.notifier_id, owner = %binding.owner_id, "no adapter registered for notifier");
            return;
        };

        self.deliver_to(binding, adapter, semaphore, event).await;
    }

    async fn deliver_broadcast(
        &self,
        owner_id: &str,
        notifier_name: &str,
        adapter: Arc<dyn crate::registry::NotifierAdapter>,
        semaphore: Arc<tokio::sync::Semaphore>,
        event: Arc<Event>,
    ) {
        let binding = NotifierBinding {
            owner_id: owner_id.to_string(),
            notifier_id: NotifierId::Broadcast(notifier_name.to_string()),
            enabled: true,
            settings: serde_json::Value::Null,
        };
        self.deliver_to(&binding, adapter, semaphore, event).await;
    }

    async fn deliver_to(
        &self,
        binding: &NotifierBinding,
        adapter: Arc<dyn crate::registry::NotifierAdapter>,
        semaphore: Arc<tokio::sync::Semaphore>,
        event: Arc<Event>,
    ) {
        let permit = match semaphore.acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => return,
        };

        let result = adapter.deliver(binding, &event).await;
        drop(permit);

        match result {
            Ok(()) => debug!(
                notifier = %binding.notifier_id,
                owner = %binding.owner_id,
                kind = event.kind_name(),
                "delivered"
            ),
            Err(err) => warn!(
                notifier = %binding.notifier_id,
                owner = %binding.owner_id,
                kind = event.kind_name(),
                error = %err,
                "delivery failed"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::NotifierId;
    use crate::registry::NotifierAdapter;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSource {
        calls: AtomicUsize,
        bindings: Vec<NotifierBinding>,
    }

    #[async_trait]
    impl NotifierBindingSource for CountingSource {
        async fn bindings_for(&self, _owner_id: &str) -> Result<Vec<NotifierBinding>, DispatchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.bindings.clone())
        }
    }

    struct RecordingAdapter {
        delivered: std::sync::Mutex<usize>,
    }

    #[async_trait]
    impl NotifierAdapter for RecordingAdapter {
        async fn deliver(&self, _binding: &NotifierBinding, _event: &Event) -> Result<(), DispatchError> {
            *self.delivered.lock().unwrap() += 1;
            Ok(())
        }
    }

    fn binding(enabled: bool) -> NotifierBinding {
        NotifierBinding {
            owner_id: "alice".into(),
            notifier_id: NotifierId::Webhook,
            enabled,
            settings: serde_json::json!({}),
        }
    }

    #[tokio::test]
    async fn submit_skips_disabled_bindings() {
        let source = Arc::new(CountingSource {
            calls: AtomicUsize::new(0),
            bindings: vec![binding(true), binding(false)],
        });
        let adapter = Arc::new(RecordingAdapter { delivered: std::sync::Mutex::new(0) });
        let mut registry = NotifierRegistry::new();
        registry.register(NotifierId::Webhook, adapter.clone(), &DispatchConfig::default());

        let fabric = DispatchFabric::new(registry, source, &DispatchConfig::default());
        fabric
            .submit("alice", Arc::new(Event::AccountUpdated { account: "alice".into() }))
            .await
            .unwrap();

        assert_eq!(*adapter.delivered.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn bindings_are_cached_across_submits() {
        let source = Arc::new(CountingSource {
            calls: AtomicUsize::new(0),
            bindings: vec![binding(true)],
        });
        let adapter = Arc::new(RecordingAdapter { delivered: std::sync::Mutex::new(0) });
        let mut registry = NotifierRegistry::new();
        registry.register(NotifierId::Webhook, adapter, &DispatchConfig::default());

        let fabric = DispatchFabric::new(registry, source.clone(), &DispatchConfig::default());
        for _ in 0..3 {
            fabric
                .submit("alice", Arc::new(Event::AccountUpdated { account: "alice".into() }))
                .await
                .unwrap();
        }

        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn invalidate_forces_refetch() {
        let source = Arc::new(CountingSource {
            calls: AtomicUsize::new(0),
            bindings: vec![binding(true)],
        });
        let adapter = Arc::new(RecordingAdapter { delivered: std::sync::Mutex::new(0) });
        let mut registry = NotifierRegistry::new();
        registry.register(NotifierId::Webhook, adapter, &DispatchConfig::default());

        let fabric = DispatchFabric::new(registry, source.clone(), &DispatchConfig::default());
        fabric
            .submit("alice", Arc::new(Event::AccountUpdated { account: "alice".into() }))
            .await
            .unwrap();
        fabric.invalidate("alice").await;
        fabric
            .submit("alice", Arc::new(Event::AccountUpdated { account: "alice".into() }))
            .await
            .unwrap();

        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn broadcast_adapters_fire_even_without_a_binding_row() {
        let source = Arc::new(CountingSource {
            calls: AtomicUsize::new(0),
            bindings: vec![],
        });
        let broadcast_adapter = Arc::new(RecordingAdapter { delivered: std::sync::Mutex::new(0) });
        let mut registry = NotifierRegistry::new();
        registry.register_broadcast(NotifierId::Websocket, broadcast_adapter.clone(), &DispatchConfig::default());

        let fabric = DispatchFabric::new(registry, source, &DispatchConfig::default());
        fabric
            .submit("alice", Arc::new(Event::AccountUpdated { account: "alice".into() }))
            .await
            .unwrap();

        assert_eq!(*broadcast_adapter.delivered.lock().unwrap(), 1);
    }
}
