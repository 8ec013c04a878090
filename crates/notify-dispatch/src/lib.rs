//! # Notify Dispatch
//!
//! The notifier binding model, the dispatch fabric that resolves an
//! owner's bindings and fans an event out to them, and the pluggable
//! adapters themselves (webhook, chat, Telegram, Discord, websocket).
//!
//! Grounded on this workspace's hexagonal layout — a `registry` of
//! trait-object adapters keyed by kind, much like `qc-15-cross-chain`'s
//! adapter registration, plus the original's per-notifier concurrency
//! bound (`notifiers/slack/notifier.go`'s semaphore default of 1000).

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod adapters;
pub mod domain;
pub mod error;
pub mod fabric;
pub mod registry;
pub mod render;

pub use domain::{DispatchConfig, NotifierBinding, NotifierId};
pub use error::DispatchError;
pub use fabric::{DispatchFabric, NotifierBindingSource};
pub use registry::{NotifierAdapter, NotifierRegistry};
