//! # Notify Store
//!
//! The document-store port subscriptions, notifier bindings and the
//! block-processor checkpoint are persisted behind, plus an in-memory
//! adapter suitable for tests and local development.
//!
//! Grounded on this workspace's `domain`/`ports`/`adapters` hexagonal
//! split (`qc-09-finality`, `qc-15-cross-chain`).

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod error;
pub mod in_memory;
pub mod ports;

pub use error::{StoreError, StoreResult};
pub use in_memory::InMemoryStore;
pub use ports::DocumentStore;
