//! A JSON-RPC backed [`BlockSource`]/[`ContentFetcher`] with round-robin
//! endpoint failover and exponential backoff.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use notify_types::{Block, BlockNumber, Content};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};

use crate::config::RpcConfig;
use crate::error::ChainError;
use crate::ports::{BlockSource, ContentFetcher};

#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'a str,
    id: u64,
    method: &'a str,
    params: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse<T> {
    result: Option<T>,
    error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct DynamicGlobalProperties {
    last_irreversible_block_num: BlockNumber,
}

/// Round-robin, retrying JSON-RPC client. Shared by the block-stream and
/// content-fetch ports since both are "call a method on whichever endpoint
/// currently answers" — the original Go engine did the same with a single
/// `*rpc.Client` wrapped in a reconnecting dialer.
pub struct RpcBlockSource {
    client: Client,
    config: RpcConfig,
    next_endpoint: AtomicUsize,
    next_to_fetch: BlockNumber,
}

impl RpcBlockSource {
    pub fn new(config: RpcConfig, starting_block: BlockNumber) -> Self {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .expect("reqwest client configuration is static and infallible here");

        Self {
            client,
            config,
            next_endpoint: AtomicUsize::new(0),
            next_to_fetch: starting_block,
        }
    }

    fn endpoint_count(&self) -> usize {
        self.config.endpoints.len()
    }

    fn pick_endpoint(&self) -> Result<&str, ChainError> {
        if self.config.endpoints.is_empty() {
            return Err(ChainError::Fatal(
                "no CHAIN_RPC_ENDPOINTS configured".to_string(),
            ));
        }
        let idx = self.next_endpoint.fetch_add(1, Ordering::Relaxed) % self.endpoint_count();
        Ok(&self.config.endpoints[idx])
    }

    /// Call `method` once against the next endpoint in round-robin order.
    async fn call_once<T: for<'de> Deserialize<'de>>(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<T, ChainError> {
        let endpoint = self.pick_endpoint()?;
        let body = JsonRpcRequest {
            jsonrpc: "2.0",
            id: 1,
            method,
            params,
        };

        let response = self
            .client
            .post(endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| ChainError::Transient(format!("request to {endpoint} failed: {e}")))?;

        if !response.status().is_success() {
            return Err(ChainError::Transient(format!(
                "{endpoint} returned HTTP {}",
                response.status()
            )));
        }

        let parsed: JsonRpcResponse<T> = response
            .json()
            .await
            .map_err(|e| ChainError::Transient(format!("malformed JSON-RPC body: {e}")))?;

        if let Some(error) = parsed.error {
            return Err(ChainError::Fatal(format!("RPC error: {}", error.message)));
        }

        parsed
            .result
            .ok_or_else(|| ChainError::Fatal("RPC response carried neither result nor error".to_string()))
    }

    /// Try every endpoint once, bounded — used for one-shot lookups
    /// (content fetches) that must fail the caller rather than block
    /// forever.
    async fn call_with_failover<T: for<'de> Deserialize<'de>>(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<T, ChainError> {
        let attempts = self.endpoint_count().max(1);
        let mut last_err = None;
        for _ in 0..attempts {
            match self.call_once(method, params.clone()).await {
                Ok(value) => return Ok(value),
                Err(ChainError::Fatal(msg)) => return Err(ChainError::Fatal(msg)),
                Err(err) => last_err = Some(err),
            }
        }
        Err(last_err.unwrap_or_else(|| ChainError::Fatal("no endpoints configured".to_string())))
    }

    /// Poll for a block, blocking behind an exponential backoff until one
    /// is available or a fatal error occurs. This is what lets
    /// `next_block` present a single "await the next block" call to the
    /// engine while hiding reconnection underneath.
    async fn call_until_success<T: for<'de> Deserialize<'de>>(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<T, ChainError> {
        let mut backoff = self.config.backoff_initial;
        loop {
            match self.call_with_failover(method, params.clone()).await {
                Ok(value) => return Ok(value),
                Err(ChainError::Fatal(msg)) => return Err(ChainError::Fatal(msg)),
                Err(err) => {
                    warn!(error = %err, backoff_ms = backoff.as_millis(), "block source retrying after transient error");
                    tokio::time::sleep(backoff).await;
                    backoff = (backoff * 2).min(self.config.backoff_max);
                }
            }
        }
    }
}

#[async_trait]
impl BlockSource for RpcBlockSource {
    async fn block_range(&self) -> BlockNumber {
        self.next_to_fetch
    }

    async fn next_block(&mut self) -> Result<Block, ChainError> {
        let block: Block = self
            .call_until_success("get_block", json!([self.next_to_fetch]))
            .await?;
        debug!(block_number = block.number, "fetched block");
        self.next_to_fetch = block.number + 1;
        Ok(block)
    }

    async fn last_irreversible_block(&self) -> Result<BlockNumber, ChainError> {
        let props: DynamicGlobalProperties = self
            .call_with_failover("get_dynamic_global_properties", json!([]))
            .await?;
        Ok(props.last_irreversible_block_num)
    }
}

#[async_trait]
impl ContentFetcher for RpcBlockSource {
    async fn get_content(&self, author: &str, permlink: &str) -> Result<Content, ChainError> {
        self.call_with_failover("get_content", json!([author, permlink]))
            .await
    }
}
