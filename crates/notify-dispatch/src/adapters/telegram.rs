//! Telegram bot adapter. Telegram's bot API is plain HTTPS JSON, unlike
//! Discord's gateway socket, so delivery is a single POST per event —
//! no persistent session to maintain.

use async_trait::async_trait;
use serde::Deserialize;

use crate::domain::NotifierBinding;
use crate::error::DispatchError;
use crate::registry::NotifierAdapter;
use crate::render::render_text;
use notify_events::Event;

const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

fn steemit_link(account: &str) -> String {
    format!("[@{account}](https://steemit.com/@{account})")
}

/// The only per-owner field this adapter needs — the bot token is an
/// ambient daemon credential, supplied once at construction.
#[derive(Debug, Deserialize)]
struct TelegramSettings {
    chat_id: i64,
}

pub struct TelegramNotifier {
    client: reqwest::Client,
    bot_token: String,
}

impl TelegramNotifier {
    pub fn new(client: reqwest::Client, bot_token: String) -> Self {
        Self { client, bot_token }
    }
}

#[async_trait]
impl NotifierAdapter for TelegramNotifier {
    async fn deliver(&self, binding: &NotifierBinding, event: &Event) -> Result<(), DispatchError> {
        let settings: TelegramSettings = serde_json::from_value(binding.settings.clone())
            .map_err(|e| DispatchError::SettingsDecode(e.to_string()))?;

        let text = render_text(event, steemit_link);
        let url = format!("{TELEGRAM_API_BASE}/bot{}/sendMessage", self.bot_token);

        self.client
            .post(&url)
            .json(&serde_json::json!({
                "chat_id": settings.chat_id,
                "text": text,
                "parse_mode": "Markdown",
            }))
            .send()
            .await
            .map_err(|e| DispatchError::Transport(e.to_string()))?
            .error_for_status()
            .map_err(|e| DispatchError::Transport(e.to_string()))?;
        Ok(())
    }
}
