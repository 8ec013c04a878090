//! The checkpointer: a single long-lived task that periodically
//! persists the latest processed block's checkpoint and flushes once
//! more on shutdown.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use notify_store::DocumentStore;
use notify_types::{Block, Checkpoint};

const FLUSH_INTERVAL: Duration = Duration::from_secs(60);

/// What the block processor publishes after fully accounting for one
/// block. `watch` gives single-slot, always-overwrite semantics: if the
/// checkpointer is slow, only the latest block's update survives.
pub type CheckpointUpdate = Block;

/// Runs until `cancel` fires, persisting `current` to `store` on every
/// tick and once more (holding `block_lock`, as a barrier against any
/// in-flight block processing) before returning.
pub async fn run(
    store: Arc<dyn DocumentStore>,
    block_lock: Arc<Mutex<()>>,
    mut block_rx: watch::Receiver<Option<CheckpointUpdate>>,
    starting: Checkpoint,
    cancel: CancellationToken,
) {
    let mut current = starting;
    let mut interval = tokio::time::interval(FLUSH_INTERVAL);
    interval.tick().await; // first tick fires immediately; skip it

    loop {
        tokio::select! {
            _ = block_rx.changed() => {
                if let Some(block) = block_rx.borrow_and_update().clone() {
                    current = current.advance_past(&block);
                }
            }
            _ = interval.tick() => {
                if let Err(err) = store.save_checkpoint(&current).await {
                    error!(error = %err, "checkpoint flush failed, stopping checkpointer");
                    return;
                }
                info!(next_block_num = current.next_block_num, "checkpoint flushed");
            }
            _ = cancel.cancelled() => {
                let _guard = block_lock.lock().await;
                if let Some(block) = block_rx.borrow().clone() {
                    current = current.advance_past(&block);
                }
                if let Err(err) = store.save_checkpoint(&current).await {
                    error!(error = %err, "final checkpoint flush failed");
                }
                info!(next_block_num = current.next_block_num, "checkpointer exiting");
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify_store::InMemoryStore;
    use notify_types::{Block, Timestamp};

    fn block(number: u32) -> Block {
        Block {
            number,
            timestamp: Timestamp(chrono::DateTime::from_timestamp(0, 0).unwrap()),
            transactions: Vec::new(),
        }
    }

    #[tokio::test]
    async fn shutdown_persists_the_latest_pending_block() {
        let store: Arc<dyn DocumentStore> = Arc::new(InMemoryStore::new());
        let block_lock = Arc::new(Mutex::new(()));
        let (tx, rx) = watch::channel(None);
        let cancel = CancellationToken::new();

        let handle = tokio::spawn(run(store.clone(), block_lock, rx, Checkpoint::genesis(1), cancel.clone()));

        tx.send(Some(block(5))).unwrap();
        cancel.cancel();
        handle.await.unwrap();

        let saved = store.load_checkpoint().await.unwrap().unwrap();
        assert_eq!(saved.next_block_num, 6);
    }
}
