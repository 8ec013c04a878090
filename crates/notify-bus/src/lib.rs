//! # Notify Bus
//!
//! The subscription index (`notify-subscriptions`) is built once at startup
//! from a full scan of the `events` store and then swapped wholesale on
//! reload (spec §4.3.2). This crate carries the one signal that triggers a
//! reload: something mutated the subscription store out of band — the admin
//! HTTP surface or a notifier's own ingress (a chat bot's `link`/`enable`/
//! `disable`/`unlink` commands).
//!
//! Modeled after the teacher workspace's `shared-bus`, trimmed to the single
//! topic this engine actually needs; a general multi-topic choreography bus
//! would be premature here.

#![warn(clippy::all)]
#![deny(unsafe_code)]

use tokio::sync::broadcast;
use tracing::debug;

/// Default channel capacity. Reload signals are coalesced by the receiver
/// (a pending reload is still a reload), so a small buffer is plenty.
pub const DEFAULT_CAPACITY: usize = 64;

/// The subscription store changed and the index should be rebuilt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionsChanged;

/// Publishing side of the signal bus.
#[derive(Clone)]
pub struct SignalBus {
    sender: broadcast::Sender<SubscriptionsChanged>,
}

impl SignalBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Notify subscribers the subscription store has changed.
    ///
    /// Returns the number of active subscribers notified; zero subscribers
    /// is not an error (the index-reload task may not have started yet).
    pub fn notify_changed(&self) -> usize {
        match self.sender.send(SubscriptionsChanged) {
            Ok(receivers) => {
                debug!(receivers, "published subscriptions-changed signal");
                receivers
            }
            Err(_) => 0,
        }
    }

    /// Subscribe to reload signals.
    pub fn subscribe(&self) -> SignalReceiver {
        SignalReceiver {
            receiver: self.sender.subscribe(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for SignalBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiving side of the signal bus.
pub struct SignalReceiver {
    receiver: broadcast::Receiver<SubscriptionsChanged>,
}

impl SignalReceiver {
    /// Wait for the next reload signal. Lagged signals (the receiver fell
    /// behind) are coalesced into a single wakeup rather than surfaced as
    /// an error — a reload is idempotent, so missing intermediate signals
    /// is harmless.
    pub async fn recv(&mut self) -> SubscriptionsChanged {
        loop {
            match self.receiver.recv().await {
                Ok(signal) => return signal,
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => {
                    std::future::pending::<()>().await;
                    unreachable!()
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn delivers_signal_to_subscriber() {
        let bus = SignalBus::new();
        let mut rx = bus.subscribe();

        assert_eq!(bus.notify_changed(), 1);
        rx.recv().await;
    }

    #[tokio::test]
    async fn no_subscribers_is_not_an_error() {
        let bus = SignalBus::new();
        assert_eq!(bus.notify_changed(), 0);
    }

    #[tokio::test]
    async fn multiple_subscribers_all_notified() {
        let bus = SignalBus::new();
        let mut a = bus.subscribe();
        let mut b = bus.subscribe();

        assert_eq!(bus.notify_changed(), 2);
        a.recv().await;
        b.recv().await;
    }
}
