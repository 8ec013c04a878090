//! Engine-wide configuration, read once at startup and failed fast on.

use std::env;
use std::net::SocketAddr;

use thiserror::Error;

use notify_chain::RpcConfig;
use notify_dispatch::DispatchConfig;
use notify_telemetry::TelemetryConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("environment variable {0} is not valid: {1}")]
    Invalid(&'static str, String),
}

/// Top-level configuration for the `notify-engine` binary. Construction
/// is fail-fast: a missing or unparsable required value is a startup
/// error, never a silently-defaulted one.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Bind address for the websocket fan-out notifier's HTTP upgrade
    /// endpoint.
    pub listen_address: SocketAddr,

    /// Public base URL used when rendering links back to content.
    pub canonical_url: String,

    /// Connection string for whatever `DocumentStore` adapter is wired
    /// in. `notify-engine` passes this through opaquely; it never parses
    /// it itself (the shipped `InMemoryStore` ignores it entirely).
    pub mongo_url: String,

    /// Block number the engine starts from when the store holds no
    /// checkpoint yet. If unset, the engine queries the chain's last
    /// irreversible block via `get_dynamic_global_properties` at startup
    /// instead of guessing a genesis number.
    pub starting_block: Option<notify_types::BlockNumber>,

    /// Number of block-processor worker tasks. The original ran a
    /// single serialized processor; this stays 1 by default since
    /// `BlockProcessor::block_lock` only allows one block in flight at
    /// a time regardless, but the knob is kept for forward-compat with
    /// a sharded processor.
    pub block_processor_worker_count: usize,

    pub rpc: RpcConfig,
    pub dispatch: DispatchConfig,
    pub telemetry: TelemetryConfig,

    pub telegram_bot_token: Option<String>,
    pub discord_bot_token: Option<String>,
    pub rocketchat_base_url: Option<String>,
    pub rocketchat_admin_token: Option<String>,
}

impl EngineConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let listen_address = require("LISTEN_ADDRESS")?
            .parse()
            .map_err(|e| ConfigError::Invalid("LISTEN_ADDRESS", format!("{e}")))?;

        let canonical_url = require("CANONICAL_URL")?;
        let mongo_url = require("MONGO_URL")?;

        let starting_block = env::var("STARTING_BLOCK")
            .ok()
            .map(|v| v.parse().map_err(|e| ConfigError::Invalid("STARTING_BLOCK", format!("{e}"))))
            .transpose()?;

        let block_processor_worker_count = require("BLOCK_PROCESSOR_WORKER_COUNT")?
            .parse()
            .map_err(|e| ConfigError::Invalid("BLOCK_PROCESSOR_WORKER_COUNT", format!("{e}")))?;

        Ok(Self {
            listen_address,
            canonical_url,
            mongo_url,
            starting_block,
            block_processor_worker_count,
            rpc: RpcConfig::from_env(),
            dispatch: DispatchConfig::default(),
            telemetry: TelemetryConfig::from_env(),
            telegram_bot_token: env::var("TELEGRAM_BOT_TOKEN").ok(),
            discord_bot_token: env::var("DISCORD_BOT_TOKEN").ok(),
            rocketchat_base_url: env::var("ROCKETCHAT_BASE_URL").ok(),
            rocketchat_admin_token: env::var("ROCKETCHAT_ADMIN_TOKEN").ok(),
        })
    }
}

fn require(name: &'static str) -> Result<String, ConfigError> {
    env::var(name).map_err(|_| ConfigError::Missing(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn require_reports_the_missing_variable_name() {
        let err = require("NOTIFY_ENGINE_DEFINITELY_UNSET_VAR").unwrap_err();
        assert!(matches!(err, ConfigError::Missing("NOTIFY_ENGINE_DEFINITELY_UNSET_VAR")));
    }
}
