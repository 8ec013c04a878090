pub mod discord;
pub mod telegram;
pub mod webhook;
pub mod websocket;

pub use discord::DiscordNotifier;
pub use telegram::TelegramNotifier;
pub use webhook::{ChatPostMessageNotifier, WebhookNotifier};
pub use websocket::{run_connection, WebsocketNotifier};
