//! Telegram Bot transport — message sending via the Bot API.

use async_trait::async_trait;
use serde::Deserialize;

use bizpulse_core::error::{BizPulseError, Result};
use bizpulse_core::traits::Transport;
use bizpulse_core::types::{EventCategory, Message};

const REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(10);

/// Telegram Bot API transport. One shared `reqwest::Client`; no per-call
/// mutable state, so it is safe behind an `Arc` across dispatch workers.
pub struct TelegramTransport {
    bot_token: String,
    client: reqwest::Client,
}

impl TelegramTransport {
    pub fn new(bot_token: String) -> Self {
        Self {
            bot_token,
            client: reqwest::Client::new(),
        }
    }

    fn api_url(&self, method: &str) -> String {
        format!("https://api.telegram.org/bot{}/{}", self.bot_token, method)
    }

    /// Send a text message to a chat.
    async fn send_message(&self, chat_id: &str, text: &str) -> Result<()> {
        let body = serde_json::json!({
            "chat_id": chat_id,
            "text": text,
            "parse_mode": "Markdown",
        });

        let response = self
            .client
            .post(self.api_url("sendMessage"))
            .json(&body)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(|e| BizPulseError::Channel(format!("sendMessage failed: {e}")))?;

        let result: TelegramApiResponse<serde_json::Value> = response
            .json()
            .await
            .map_err(|e| BizPulseError::Channel(format!("Invalid send response: {e}")))?;

        if !result.ok {
            return Err(BizPulseError::Channel(format!(
                "Send failed: {}",
                result.description.unwrap_or_default()
            )));
        }
        Ok(())
    }

    /// Get bot info — used as the reachability probe.
    async fn get_me(&self) -> Result<()> {
        let response = self
            .client
            .get(self.api_url("getMe"))
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(|e| BizPulseError::Channel(format!("getMe failed: {e}")))?;
        let body: TelegramApiResponse<TelegramUser> = response
            .json()
            .await
            .map_err(|e| BizPulseError::Channel(format!("Invalid getMe response: {e}")))?;
        let me = body
            .result
            .ok_or_else(|| BizPulseError::Channel("No bot info".into()))?;
        tracing::debug!(
            "Telegram bot: @{} ({})",
            me.username.as_deref().unwrap_or("unknown"),
            me.first_name
        );
        Ok(())
    }
}

#[async_trait]
impl Transport for TelegramTransport {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn deliver(
        &self,
        recipient_id: &str,
        message: &Message,
        _category: EventCategory,
    ) -> Result<()> {
        // The Bot API has no category field; it rides in the message text.
        self.send_message(recipient_id, &escape_markdown(&message.text))
            .await
    }

    async fn healthcheck(&self) -> Result<()> {
        self.get_me().await
    }
}

/// Escape Telegram MarkdownV1 special characters.
fn escape_markdown(s: &str) -> String {
    s.replace('_', "\\_")
        .replace('*', "\\*")
        .replace('[', "\\[")
        .replace('`', "\\`")
}

// --- Telegram API Types ---

#[derive(Debug, Deserialize)]
struct TelegramApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TelegramUser {
    first_name: String,
    username: Option<String>,
}
