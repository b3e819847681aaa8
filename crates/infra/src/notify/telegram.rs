//! Telegram Bot API adapter.
//!
//! Covers the two calls this service needs: `sendMessage` for broadcasts and
//! `getUpdates` for the `/start` long-poll loop.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use tinkerscout_core::RecipientId;

use super::{DeliveryError, NotificationChannel};

pub const DEFAULT_API_URL: &str = "https://api.telegram.org";

#[derive(Debug, Clone)]
pub struct TelegramConfig {
    pub token: String,
    pub api_url: String,
    pub request_timeout: Duration,
}

impl TelegramConfig {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            api_url: DEFAULT_API_URL.to_string(),
            request_timeout: Duration::from_secs(15),
        }
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum TelegramError {
    #[error("telegram http error: {0}")]
    Http(String),
    #[error("telegram api error {code}: {description}")]
    Api { code: i64, description: String },
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    error_code: Option<i64>,
    description: Option<String>,
}

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
}

/// One entry of a `getUpdates` reply. Only the fields the bot reads.
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<IncomingMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IncomingMessage {
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

/// Long-lived Bot API handle shared by the notifier and the update poller.
#[derive(Debug, Clone)]
pub struct TelegramChannel {
    http: Client,
    config: TelegramConfig,
}

impl TelegramChannel {
    pub fn new(config: TelegramConfig) -> Result<Self, TelegramError> {
        let http = Client::builder()
            .build()
            .map_err(|e| TelegramError::Http(format!("failed to build http client: {e}")))?;
        Ok(Self { http, config })
    }

    fn method_url(&self, method: &str) -> String {
        format!(
            "{}/bot{}/{}",
            self.config.api_url.trim_end_matches('/'),
            self.config.token,
            method
        )
    }

    async fn decode<T: serde::de::DeserializeOwned>(
        res: reqwest::Response,
    ) -> Result<Option<T>, TelegramError> {
        let status = res.status();
        let body: ApiResponse<T> = res.json().await.map_err(|e| {
            TelegramError::Http(format!("undecodable reply (HTTP {status}): {}", e.without_url()))
        })?;
        if !body.ok {
            return Err(TelegramError::Api {
                code: body.error_code.unwrap_or(i64::from(status.as_u16())),
                description: body.description.unwrap_or_default(),
            });
        }
        Ok(body.result)
    }

    /// `sendMessage` as plain text.
    pub async fn send_message(&self, chat_id: &str, text: &str) -> Result<(), TelegramError> {
        let res = self
            .http
            .post(self.method_url("sendMessage"))
            .timeout(self.config.request_timeout)
            .json(&SendMessage { chat_id, text })
            .send()
            .await
            // Errors carry the request URL, which embeds the bot token.
            .map_err(|e| TelegramError::Http(e.without_url().to_string()))?;
        Self::decode::<serde_json::Value>(res).await?;
        Ok(())
    }

    /// Long-poll `getUpdates` starting at `offset`.
    pub async fn get_updates(
        &self,
        offset: i64,
        long_poll: Duration,
    ) -> Result<Vec<Update>, TelegramError> {
        let res = self
            .http
            .get(self.method_url("getUpdates"))
            .query(&[
                ("offset", offset.to_string()),
                ("timeout", long_poll.as_secs().to_string()),
                ("allowed_updates", r#"["message"]"#.to_string()),
            ])
            .timeout(long_poll + self.config.request_timeout)
            .send()
            .await
            .map_err(|e| TelegramError::Http(e.without_url().to_string()))?;
        let updates = Self::decode::<Vec<Update>>(res).await?.unwrap_or_default();
        debug!(count = updates.len(), "telegram updates received");
        Ok(updates)
    }
}

#[async_trait::async_trait]
impl NotificationChannel for TelegramChannel {
    async fn send(&self, recipient: &RecipientId, text: &str) -> Result<(), DeliveryError> {
        self.send_message(recipient.as_str(), text)
            .await
            .map_err(|e| DeliveryError::new(recipient, e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_url_embeds_token() {
        let channel =
            TelegramChannel::new(TelegramConfig::new("123:abc").with_api_url("http://tg.local/"))
                .unwrap();
        assert_eq!(channel.method_url("sendMessage"), "http://tg.local/bot123:abc/sendMessage");
    }

    #[test]
    fn api_envelope_fields_are_optional() {
        let failed: ApiResponse<Vec<Update>> =
            serde_json::from_str(r#"{"ok":false,"description":"Unauthorized"}"#).unwrap();
        assert!(!failed.ok);
        assert!(failed.result.is_none());
        assert!(failed.error_code.is_none());

        let sent: ApiResponse<serde_json::Value> =
            serde_json::from_str(r#"{"ok":true,"result":{"message_id":1}}"#).unwrap();
        assert!(sent.ok);
        assert!(sent.result.is_some());
    }

    #[test]
    fn update_without_message_deserializes() {
        let updates: Vec<Update> = serde_json::from_str(
            r#"[{"update_id":1},{"update_id":2,"message":{"chat":{"id":-5},"text":"/start"}}]"#,
        )
        .unwrap();
        assert!(updates[0].message.is_none());
        let msg = updates[1].message.as_ref().unwrap();
        assert_eq!(msg.chat.id, -5);
        assert_eq!(msg.text.as_deref(), Some("/start"));
    }
}
