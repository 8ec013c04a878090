//! The block processor: pulls blocks in order from a `BlockSource`,
//! mines events from every operation, resolves interested owners, and
//! submits dispatch tasks — all under `block_lock`, held for the whole
//! block so the checkpoint can never observe a half-processed block.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{watch, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use notify_chain::{BlockSource, ChainError, ContentFetcher};
use notify_dispatch::DispatchFabric;
use notify_subscriptions::{ResolveError, SubscriptionIndex};
use notify_telemetry::Metrics;
use notify_types::Block;

use crate::checkpoint::CheckpointUpdate;

#[derive(Debug, Error)]
pub enum ProcessorError {
    #[error("chain error: {0}")]
    Chain(#[from] ChainError),
    #[error("resolution error: {0}")]
    Resolve(#[from] ResolveError),
    #[error("miner error: {0}")]
    Mine(#[from] notify_events::ParseError),
}

/// Drives one `BlockSource` to completion (or cancellation). Owns the
/// source by value — only this task ever calls `next_block`, so no
/// synchronization is needed there; `block_lock` is for the
/// checkpointer's shutdown barrier, not for excluding other processors.
pub struct BlockProcessor<B: BlockSource> {
    block_source: B,
    content_fetcher: Arc<dyn ContentFetcher>,
    index: Arc<arc_swap::ArcSwap<SubscriptionIndex>>,
    fabric: Arc<DispatchFabric>,
    block_lock: Arc<Mutex<()>>,
    checkpoint_tx: watch::Sender<Option<CheckpointUpdate>>,
    metrics: Arc<Metrics>,
}

impl<B: BlockSource> BlockProcessor<B> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        block_source: B,
        content_fetcher: Arc<dyn ContentFetcher>,
        index: Arc<arc_swap::ArcSwap<SubscriptionIndex>>,
        fabric: Arc<DispatchFabric>,
        block_lock: Arc<Mutex<()>>,
        checkpoint_tx: watch::Sender<Option<CheckpointUpdate>>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            block_source,
            content_fetcher,
            index,
            fabric,
            block_lock,
            checkpoint_tx,
            metrics,
        }
    }

    /// Pulls and processes blocks until `cancel` fires or a fatal error
    /// occurs. A fatal error stops the loop; the caller decides whether
    /// that should bring the whole engine down.
    pub async fn run(mut self, cancel: CancellationToken) {
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!("block source stopping pulls, in-flight block completes");
                    return;
                }
                result = self.block_source.next_block() => {
                    match result {
                        Ok(block) => {
                            let start = std::time::Instant::now();
                            let number = block.number;
                            if let Err(err) = self.process_block(block).await {
                                error!(block_number = number, error = %err, "fatal error processing block");
                                return;
                            }
                            self.metrics.blocks_processed_total.inc();
                            self.metrics
                                .block_process_duration_seconds
                                .observe(start.elapsed().as_secs_f64());
                            self.metrics.checkpoint_block_number.set(number as i64 + 1);
                        }
                        Err(ChainError::Fatal(reason)) => {
                            error!(reason, "block source reported a fatal error");
                            return;
                        }
                        Err(ChainError::Transient(reason)) => {
                            debug!(reason, "transient block source error, retrying");
                        }
                    }
                }
            }
        }
    }

    async fn process_block(&self, block: Block) -> Result<(), ProcessorError> {
        let _guard = self.block_lock.lock().await;

        for transaction in &block.transactions {
            for operation in &transaction.operations {
                let content = match operation.content_ref() {
                    Some((author, permlink)) => {
                        Some(self.content_fetcher.get_content(author, permlink).await?)
                    }
                    None => None,
                };

                let events = notify_events::mine(operation, content.as_ref())?;
                for event in events {
                    self.metrics.events_mined_total.with_label_values(&[event.kind_name()]).inc();

                    let index = self.index.load();
                    let owners = index.resolve(&event, self.content_fetcher.as_ref()).await?;

                    let event = Arc::new(event);
                    for owner in owners {
                        let fabric = self.fabric.clone();
                        let event = event.clone();
                        let metrics = self.metrics.clone();
                        tokio::spawn(async move {
                            let kind = event.kind_name().to_string();
                            match fabric.submit(&owner, event).await {
                                Ok(()) => {
                                    metrics.notifications_dispatched_total.with_label_values(&[&kind]).inc();
                                }
                                Err(err) => {
                                    metrics.notifications_failed_total.with_label_values(&[&kind]).inc();
                                    error!(owner = %owner, kind = %kind, error = %err, "dispatch submission failed");
                                }
                            }
                        });
                    }
                }
            }
        }

        let _ = self.checkpoint_tx.send(Some(block));
        Ok(())
    }
}
