//! In-process websocket fan-out notifier: one connection per owner,
//! reconnecting evicts whatever connection was previously registered.
//!
//! Grounded on `qc-16-api-gateway::ws::SubscriptionManager` — a
//! concurrent map from connection key to an outbound channel, with the
//! same "replace, don't stack" eviction policy (there the map key is a
//! subscription id, here it's the owner id, since a websocket notifier
//! binding has at most one live connection per owner at a time).

use axum::extract::ws::{Message, WebSocket};
use dashmap::DashMap;
use futures::{SinkExt, StreamExt};
use serde_json::json;
use tokio::sync::mpsc;
use tracing::debug;

use crate::domain::NotifierBinding;
use async_trait::async_trait;
use crate::error::DispatchError;
use crate::registry::NotifierAdapter;
use crate::render::render_webhook;
use notify_events::Event;

/// Tracks the one live websocket connection per owner and fans rendered
/// events into it. Implements [`NotifierAdapter`] directly, so the
/// dispatch fabric can deliver to it the same way as any other adapter.
pub struct WebsocketNotifier {
    connections: DashMap<String, mpsc::UnboundedSender<Message>>,
}

impl Default for WebsocketNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl WebsocketNotifier {
    pub fn new() -> Self {
        Self { connections: DashMap::new() }
    }

    /// Registers a freshly accepted connection for `owner_id`, evicting
    /// whatever connection was registered before it (the prior
    /// connection's sender is simply dropped, which closes its socket
    /// task's receive loop).
    pub fn register(&self, owner_id: String, sender: mpsc::UnboundedSender<Message>) {
        if self.connections.insert(owner_id.clone(), sender).is_some() {
            debug!(owner = %owner_id, "evicted previous websocket connection");
        }
    }

    pub fn unregister(&self, owner_id: &str) {
        self.connections.remove(owner_id);
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }
}

#[async_trait]
impl NotifierAdapter for WebsocketNotifier {
    async fn deliver(&self, binding: &NotifierBinding, event: &Event) -> Result<(), DispatchError> {
        let Some(sender) = self.connections.get(&binding.owner_id) else {
            // Owner has no live connection; this is normal (most
            // notifications arrive while the browser tab is closed), not
            // a delivery failure.
            return Ok(());
        };

        let payload = json!({
            "kind": event.kind_name(),
            "event": render_webhook(event),
        });
        let text = serde_json::to_string(&payload).map_err(|e| DispatchError::Transport(e.to_string()))?;

        sender
            .send(Message::Text(text))
            .map_err(|_| DispatchError::Transport("websocket connection closed".into()))
    }
}

/// Drives one accepted websocket connection: registers it, relays
/// outbound messages until the socket closes or the owner's connection
/// is evicted by a newer one, then unregisters.
pub async fn run_connection(notifier: &WebsocketNotifier, owner_id: String, socket: WebSocket) {
    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel();
    notifier.register(owner_id.clone(), tx);

    let relay = async {
        while let Some(message) = rx.recv().await {
            if sink.send(message).await.is_err() {
                break;
            }
        }
    };

    let drain_inbound = async {
        while let Some(Ok(_)) = stream.next().await {
            // inbound frames are ignored; this is a push-only channel
        }
    };

    tokio::select! {
        _ = relay => {}
        _ = drain_inbound => {}
    }

    notifier.unregister(&owner_id);
    debug!(owner = %owner_id, "websocket connection closed");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::NotifierId;

    fn binding(owner: &str) -> NotifierBinding {
        NotifierBinding {
            owner_id: owner.into(),
            notifier_id: NotifierId::Websocket,
            enabled: true,
            settings: json!({}),
        }
    }

    #[tokio::test]
    async fn delivery_without_connection_is_a_noop() {
        let notifier = WebsocketNotifier::new();
        let result = notifier
            .deliver(&binding("alice"), &Event::AccountUpdated { account: "alice".into() })
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn registering_a_connection_lets_delivery_reach_it() {
        let notifier = WebsocketNotifier::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        notifier.register("alice".into(), tx);

        notifier
            .deliver(&binding("alice"), &Event::AccountUpdated { account: "alice".into() })
            .await
            .unwrap();

        let message = rx.recv().await.unwrap();
        assert!(matches!(message, Message::Text(_)));
    }

    #[tokio::test]
    async fn reconnecting_evicts_the_prior_sender() {
        let notifier = WebsocketNotifier::new();
        let (tx1, mut rx1) = mpsc::unbounded_channel();
        let (tx2, mut rx2) = mpsc::unbounded_channel();
        notifier.register("alice".into(), tx1);
        notifier.register("alice".into(), tx2);

        notifier
            .deliver(&binding("alice"), &Event::AccountUpdated { account: "alice".into() })
            .await
            .unwrap();

        assert!(rx1.recv().await.is_none() || rx1.try_recv().is_err());
        assert!(rx2.try_recv().is_ok());
    }
}
