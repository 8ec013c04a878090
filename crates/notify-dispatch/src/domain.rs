//! Notifier bindings and dispatch configuration.

use serde::{Deserialize, Serialize};

/// Identifies which notifier adapter a [`NotifierBinding`] is for.
///
/// `Broadcast` is a sentinel for adapters with no per-owner settings (a
/// shared channel every matching owner is fanned into); the shipped
/// adapters all carry per-owner settings and use the named variants, but
/// the registry treats both the same way rather than keeping a second,
/// parallel table for broadcast-style notifiers (see DESIGN.md).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NotifierId {
    Webhook,
    ChatPostMessage,
    Telegram,
    Discord,
    Websocket,
    Broadcast(String),
}

impl std::fmt::Display for NotifierId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotifierId::Webhook => write!(f, "webhook"),
            NotifierId::ChatPostMessage => write!(f, "chat_postmessage"),
            NotifierId::Telegram => write!(f, "telegram"),
            NotifierId::Discord => write!(f, "discord"),
            NotifierId::Websocket => write!(f, "websocket"),
            NotifierId::Broadcast(name) => write!(f, "broadcast:{name}"),
        }
    }
}

/// One user's binding to one notifier. `settings` stays an opaque JSON
/// blob at the fabric boundary — each adapter owns its own settings
/// schema and decodes/validates it on first use, the fabric never
/// inspects it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifierBinding {
    pub owner_id: String,
    pub notifier_id: NotifierId,
    pub enabled: bool,
    pub settings: serde_json::Value,
}

/// Tuning knobs for the dispatch fabric.
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// How long a resolved owner's notifier bindings stay cached before
    /// the fabric re-fetches them from the store. Bounded at 60s by the
    /// staleness requirement; 30s matches the legacy default.
    pub binding_cache_ttl: std::time::Duration,

    /// Concurrent in-flight deliveries allowed per adapter. The original
    /// Slack notifier defaulted to 1000; every adapter here inherits the
    /// same default unless overridden.
    pub max_concurrent_per_adapter: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            binding_cache_ttl: std::time::Duration::from_secs(30),
            max_concurrent_per_adapter: 1000,
        }
    }
}
