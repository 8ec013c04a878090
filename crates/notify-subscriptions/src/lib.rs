//! # Notify Subscriptions
//!
//! Subscription documents, the normalization invariant every stored
//! attribute set must satisfy, and the inverted-index resolver that
//! answers "which owners care about this event" in O(1) hash lookups per
//! attribute rather than a query engine.
//!
//! Grounded on `notifications/db.go` (the original's QL-backed inverted
//! index) and this workspace's hexagonal crate layout (`qc-09-finality`).

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod domain;
pub mod error;
pub mod index;

pub use domain::{normalize, SelectorMode, Subscription, SubscriptionKind};
pub use domain::Selector;
pub use error::{ResolveError, ResolveResult};
pub use index::{OwnerId, SubscriptionIndex, DEFAULT_DESCENDANT_WALK_MAX_DEPTH};
