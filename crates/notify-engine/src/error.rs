//! Top-level engine error, aggregating every port-boundary error this
//! crate drives plus the startup-only failure modes none of those ports
//! express on their own.

use thiserror::Error;

use notify_chain::ChainError;
use notify_dispatch::DispatchError;
use notify_store::StoreError;
use notify_subscriptions::ResolveError;

use crate::config::ConfigError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("chain error: {0}")]
    Chain(#[from] ChainError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("subscription resolution error: {0}")]
    Resolve(#[from] ResolveError),

    #[error("dispatch error: {0}")]
    Dispatch(#[from] DispatchError),

    /// The store, chain RPC, or metrics exporter couldn't be reached
    /// while the engine was still starting up — nothing has been
    /// spawned yet, so there's nothing to shut down, only a
    /// non-zero exit.
    #[error("startup failed: {0}")]
    StartupFailed(String),
}
