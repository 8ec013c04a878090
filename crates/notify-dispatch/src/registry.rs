//! The notifier adapter registry: one concurrency-bounded adapter per
//! [`NotifierId`], looked up by the fabric on every delivery.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Semaphore;

use crate::domain::{DispatchConfig, NotifierBinding};
use crate::error::DispatchError;
use notify_events::Event;

/// A pluggable delivery backend. Implementations own their own wire
/// format and transport; the fabric only knows how to look one up by
/// [`NotifierId`] and call `deliver`.
#[async_trait]
pub trait NotifierAdapter: Send + Sync {
    /// Delivers `event` to the owner described by `binding`.
    ///
    /// `binding.settings` is adapter-specific and decoded here, not by
    /// the fabric — a malformed settings blob is a per-owner delivery
    /// failure, not a fabric-wide error.
    async fn deliver(&self, binding: &NotifierBinding, event: &Event) -> Result<(), DispatchError>;
}

struct Entry {
    adapter: Arc<dyn NotifierAdapter>,
    semaphore: Arc<Semaphore>,
}

/// Holds one adapter plus a concurrency-limiting semaphore per
/// [`NotifierId`]. Unregistered notifier ids fail delivery with
/// [`DispatchError::UnknownNotifier`] rather than panicking — a store
/// record can reference a notifier kind this process build doesn't
/// compile in.
#[derive(Default)]
pub struct NotifierRegistry {
    entries: HashMap<String, Entry>,
    broadcast: Vec<(String, Entry)>,
}

impl NotifierRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        id: impl std::fmt::Display,
        adapter: Arc<dyn NotifierAdapter>,
        config: &DispatchConfig,
    ) {
        self.entries.insert(
            id.to_string(),
            Entry {
                adapter,
                semaphore: Arc::new(Semaphore::new(config.max_concurrent_per_adapter)),
            },
        );
    }

    /// Registers an adapter that has no per-owner settings and should
    /// receive every event for every owner regardless of whether a
    /// binding row exists for them — e.g. the websocket fan-out
    /// notifier. `id` is carried only for logging; broadcast adapters
    /// are not reachable through [`NotifierRegistry::get`].
    pub fn register_broadcast(
        &mut self,
        id: impl std::fmt::Display,
        adapter: Arc<dyn NotifierAdapter>,
        config: &DispatchConfig,
    ) {
        self.broadcast.push((
            id.to_string(),
            Entry {
                adapter,
                semaphore: Arc::new(Semaphore::new(config.max_concurrent_per_adapter)),
            },
        ));
    }

    pub fn get(&self, id: impl std::fmt::Display) -> Option<(Arc<dyn NotifierAdapter>, Arc<Semaphore>)> {
        self.entries
            .get(&id.to_string())
            .map(|e| (e.adapter.clone(), e.semaphore.clone()))
    }

    pub(crate) fn broadcast_entries(&self) -> impl Iterator<Item = (&str, Arc<dyn NotifierAdapter>, Arc<Semaphore>)> {
        self.broadcast.iter().map(|(id, e)| (id.as_str(), e.adapter.clone(), e.semaphore.clone()))
    }
}
