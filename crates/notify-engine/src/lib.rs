//! # Notify Engine
//!
//! The composition root: reads configuration, builds every adapter
//! (chain RPC client, document store, dispatch fabric and notifier
//! registry), and runs the block processor, checkpointer and
//! subscription-index reload task until shutdown.

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod checkpoint;
pub mod config;
pub mod error;
pub mod metrics_server;
pub mod processor;
pub mod reload;
pub mod service;
pub mod store_bridge;
pub mod ws_server;

pub use config::{ConfigError, EngineConfig};
pub use error::EngineError;
pub use service::Engine;
