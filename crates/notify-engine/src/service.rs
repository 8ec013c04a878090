//! Composition root. Builds every adapter from [`EngineConfig`], wires
//! them into the block processor, checkpointer and reload task, and
//! drives them to completion on a shared [`CancellationToken`].

use std::sync::Arc;

use arc_swap::ArcSwap;
use tokio::sync::{watch, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::info;

use notify_bus::SignalBus;
use notify_chain::{BlockSource, RpcBlockSource};
use notify_dispatch::adapters::{ChatPostMessageNotifier, DiscordNotifier, TelegramNotifier, WebhookNotifier, WebsocketNotifier};
use notify_dispatch::{DispatchFabric, NotifierId, NotifierRegistry};
use notify_store::{DocumentStore, InMemoryStore};
use notify_subscriptions::SubscriptionIndex;
use notify_telemetry::Metrics;

use crate::checkpoint;
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::metrics_server;
use crate::processor::BlockProcessor;
use crate::reload;
use crate::store_bridge::StoreBackedBindingSource;
use crate::ws_server;

/// Everything the running engine needs to shut down cleanly, handed
/// back to `main` so it can wait on the tasks and the root token.
pub struct Engine {
    cancel: CancellationToken,
    tasks: Vec<tokio::task::JoinHandle<()>>,
}

impl Engine {
    /// Builds every component and spawns the long-lived tasks. The
    /// store is always `InMemoryStore` in this workspace (see
    /// DESIGN.md) — `config.mongo_url` is accepted and threaded through
    /// for a production adapter to consume, but unused here.
    pub async fn start(config: EngineConfig) -> Result<Self, EngineError> {
        let metrics = Arc::new(notify_telemetry::init(&config.telemetry));
        let cancel = CancellationToken::new();

        let store: Arc<dyn DocumentStore> = Arc::new(InMemoryStore::new());

        let starting_checkpoint = match store.load_checkpoint().await? {
            Some(checkpoint) => checkpoint,
            None => {
                let starting_block = match config.starting_block {
                    Some(block) => block,
                    None => {
                        let probe = RpcBlockSource::new(config.rpc.clone(), 1);
                        probe.last_irreversible_block().await?
                    }
                };
                notify_types::Checkpoint::genesis(starting_block)
            }
        };

        let subscriptions = store.scan_events().await?;
        let index = Arc::new(ArcSwap::from_pointee(SubscriptionIndex::build(subscriptions)));
        metrics.subscription_index_owners.set(index.load().owner_count() as i64);

        let http_client = reqwest::Client::builder()
            .timeout(config.rpc.request_timeout)
            .build()
            .map_err(|e| EngineError::StartupFailed(e.to_string()))?;

        let block_source = RpcBlockSource::new(config.rpc.clone(), starting_checkpoint.next_block_num);
        let content_fetcher: Arc<dyn notify_chain::ContentFetcher> =
            Arc::new(RpcBlockSource::new(config.rpc.clone(), starting_checkpoint.next_block_num));

        let websocket_notifier = Arc::new(WebsocketNotifier::new());

        let mut registry = NotifierRegistry::new();
        registry.register(NotifierId::Webhook, Arc::new(WebhookNotifier::new(http_client.clone())), &config.dispatch);

        if let (Some(base_url), Some(admin_token)) =
            (config.rocketchat_base_url.clone(), config.rocketchat_admin_token.clone())
        {
            registry.register(
                NotifierId::ChatPostMessage,
                Arc::new(ChatPostMessageNotifier::new(http_client.clone(), base_url, admin_token)),
                &config.dispatch,
            );
        }

        if let Some(bot_token) = config.telegram_bot_token.clone() {
            registry.register(
                NotifierId::Telegram,
                Arc::new(TelegramNotifier::new(http_client.clone(), bot_token)),
                &config.dispatch,
            );
        }

        if let Some(bot_token) = config.discord_bot_token.clone() {
            registry.register(
                NotifierId::Discord,
                Arc::new(DiscordNotifier::new(http_client.clone(), bot_token)),
                &config.dispatch,
            );
        }

        // The websocket fan-out notifier carries no per-owner settings —
        // it's registered as a broadcast adapter so every owner with a
        // live connection receives events regardless of whether a
        // binding row exists for them.
        registry.register_broadcast(NotifierId::Websocket, websocket_notifier.clone(), &config.dispatch);

        let binding_source = Arc::new(StoreBackedBindingSource::new(store.clone()));
        let fabric = Arc::new(DispatchFabric::new(registry, binding_source, &config.dispatch));

        let block_lock = Arc::new(Mutex::new(()));
        let (checkpoint_tx, checkpoint_rx) = watch::channel(None);

        let processor = BlockProcessor::new(
            block_source,
            content_fetcher,
            index.clone(),
            fabric,
            block_lock.clone(),
            checkpoint_tx,
            metrics.clone(),
        );

        let signal_bus = SignalBus::new();
        let reload_signals = signal_bus.subscribe();

        let mut tasks = Vec::new();
        tasks.push(tokio::spawn(processor.run(cancel.clone())));
        tasks.push(tokio::spawn(checkpoint::run(
            store.clone(),
            block_lock,
            checkpoint_rx,
            starting_checkpoint,
            cancel.clone(),
        )));
        tasks.push(tokio::spawn(reload::run(store, index, reload_signals, metrics.clone(), cancel.clone())));
        tasks.push(tokio::spawn(ws_server::run(config.listen_address, websocket_notifier, cancel.clone())));
        tasks.push(tokio::spawn(metrics_server::run(config.telemetry.metrics_port, metrics, cancel.clone())));

        info!(listen_address = %config.listen_address, "notify-engine started");

        Ok(Self { cancel, tasks })
    }

    /// Waits for every long-lived task to exit, cancelling the root
    /// token first if it hasn't fired already (idempotent shutdown
    /// trigger for callers that want to stop the engine directly,
    /// e.g. tests).
    pub async fn shutdown(self) {
        self.cancel.cancel();
        for task in self.tasks {
            let _ = task.await;
        }
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }
}
