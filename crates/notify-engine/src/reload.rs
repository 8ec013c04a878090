//! Rebuilds the subscription index whenever `notify-bus` signals the
//! store changed, and swaps it into the shared `ArcSwap` atomically so
//! readers never observe a half-built index.

use std::sync::Arc;

use arc_swap::ArcSwap;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use notify_bus::SignalReceiver;
use notify_store::DocumentStore;
use notify_subscriptions::SubscriptionIndex;
use notify_telemetry::Metrics;

pub async fn run(
    store: Arc<dyn DocumentStore>,
    index: Arc<ArcSwap<SubscriptionIndex>>,
    mut signals: SignalReceiver,
    metrics: Arc<Metrics>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = signals.recv() => {
                match rebuild(&store).await {
                    Ok(fresh) => {
                        metrics.subscription_index_owners.set(fresh.owner_count() as i64);
                        index.store(Arc::new(fresh));
                        info!("subscription index reloaded");
                    }
                    Err(err) => error!(error = %err, "subscription index reload failed, keeping stale index"),
                }
            }
        }
    }
}

async fn rebuild(store: &Arc<dyn DocumentStore>) -> Result<SubscriptionIndex, notify_store::StoreError> {
    let subscriptions = store.scan_events().await?;
    Ok(SubscriptionIndex::build(subscriptions))
}
