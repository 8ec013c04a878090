//! Incoming-webhook and `chat.postMessage`-style adapters. Both speak
//! the same wire shape (`render::WebhookPayload`) and differ only in
//! where the URL comes from: a per-owner webhook URL vs. a bot token
//! plus channel id posted to a fixed API endpoint.

use async_trait::async_trait;
use serde::Deserialize;

use crate::domain::NotifierBinding;
use crate::error::DispatchError;
use crate::registry::NotifierAdapter;
use crate::render::render_webhook;
use notify_events::Event;

#[derive(Debug, Deserialize)]
struct WebhookSettings {
    url: String,
}

/// Posts the rendered payload to a user-supplied webhook URL (e.g. a
/// Slack incoming webhook, or any HTTP endpoint accepting the same
/// `text`/`attachments` shape).
pub struct WebhookNotifier {
    client: reqwest::Client,
}

impl WebhookNotifier {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl NotifierAdapter for WebhookNotifier {
    async fn deliver(&self, binding: &NotifierBinding, event: &Event) -> Result<(), DispatchError> {
        let settings: WebhookSettings = serde_json::from_value(binding.settings.clone())
            .map_err(|e| DispatchError::SettingsDecode(e.to_string()))?;

        let payload = render_webhook(event);
        self.client
            .post(&settings.url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| DispatchError::Transport(e.to_string()))?
            .error_for_status()
            .map_err(|e| DispatchError::Transport(e.to_string()))?;
        Ok(())
    }
}

/// The only per-owner field this adapter needs — the channel it posts
/// to is derived from it (`@username`, a direct message). The API URL
/// and bot token are ambient daemon credentials, supplied once at
/// construction, not per owner.
#[derive(Debug, Deserialize)]
struct ChatPostMessageSettings {
    username: String,
}

/// Posts the rendered payload to a bot-token-authenticated
/// `chat.postMessage`-style API (Slack's own API, or a compatible
/// self-hosted chat backend) as a direct message to the owner's
/// `username`.
pub struct ChatPostMessageNotifier {
    client: reqwest::Client,
    api_url: String,
    token: String,
}

impl ChatPostMessageNotifier {
    pub fn new(client: reqwest::Client, api_url: String, token: String) -> Self {
        Self { client, api_url, token }
    }
}

#[async_trait]
impl NotifierAdapter for ChatPostMessageNotifier {
    async fn deliver(&self, binding: &NotifierBinding, event: &Event) -> Result<(), DispatchError> {
        let settings: ChatPostMessageSettings = serde_json::from_value(binding.settings.clone())
            .map_err(|e| DispatchError::SettingsDecode(e.to_string()))?;

        let mut payload = serde_json::to_value(render_webhook(event))
            .map_err(|e| DispatchError::SettingsDecode(e.to_string()))?;
        payload["channel"] = serde_json::Value::String(format!("@{}", settings.username));

        self.client
            .post(&self.api_url)
            .bearer_auth(&self.token)
            .json(&payload)
            .send()
            .await
            .map_err(|e| DispatchError::Transport(e.to_string()))?
            .error_for_status()
            .map_err(|e| DispatchError::Transport(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn webhook_settings_rejects_missing_url() {
        let value = serde_json::json!({});
        let result: Result<WebhookSettings, _> = serde_json::from_value(value);
        assert!(result.is_err());
    }

    #[test]
    fn chat_post_message_settings_parses_username() {
        let value = serde_json::json!({ "username": "alice" });
        let settings: ChatPostMessageSettings = serde_json::from_value(value).unwrap();
        assert_eq!(settings.username, "alice");
    }
}
