//! Configuration for the RPC-backed block source adapter.

use std::env;
use std::time::Duration;

/// Configuration for [`crate::adapters::RpcBlockSource`].
#[derive(Debug, Clone)]
pub struct RpcConfig {
    /// JSON-RPC endpoints tried in round-robin order on failure.
    pub endpoints: Vec<String>,

    /// Per-request timeout.
    pub request_timeout: Duration,

    /// Initial backoff delay before retrying a transient failure.
    pub backoff_initial: Duration,

    /// Ceiling the exponential backoff never exceeds.
    pub backoff_max: Duration,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            endpoints: Vec::new(),
            request_timeout: Duration::from_secs(10),
            backoff_initial: Duration::from_millis(200),
            backoff_max: Duration::from_secs(30),
        }
    }
}

impl RpcConfig {
    /// Build from `CHAIN_RPC_ENDPOINTS` (comma-separated list).
    pub fn from_env() -> Self {
        let endpoints = env::var("CHAIN_RPC_ENDPOINTS")
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();

        Self {
            endpoints,
            ..Default::default()
        }
    }
}
