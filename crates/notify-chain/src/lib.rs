//! # Notify Chain
//!
//! The outbound ports this engine drives against the watched chain — the
//! irreversible block stream and post/comment content lookup — plus a
//! JSON-RPC adapter with round-robin endpoint failover.
//!
//! Grounded on `qc-15-cross-chain`'s `ExternalChainClient` port/adapter
//! split and `tools/qc-tui`'s `reqwest` usage.

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod adapters;
pub mod config;
pub mod error;
pub mod ports;

pub use adapters::RpcBlockSource;
pub use config::RpcConfig;
pub use error::{ChainError, ChainResult};
pub use ports::{BlockSource, ContentFetcher};
