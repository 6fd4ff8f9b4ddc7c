//! REST client for the Telegram Bot API, using [`reqwest`].

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::types::Update;

/// Errors from the Telegram REST layer.
#[derive(Debug, thiserror::Error)]
pub enum TelegramError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Telegram answered with `ok: false` or a non-2xx status.
    #[error("Telegram API error ({status}): {description}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// `description` field of the error response, when present.
        description: String,
    },
}

/// Envelope every Bot API method responds with.
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: DeserializeOwned"))]
struct ApiResponse<T> {
    ok: bool,
    #[serde(default)]
    result: Option<T>,
    #[serde(default)]
    description: Option<String>,
}

/// Outbound message channel, kept behind a trait so tests can record
/// sends instead of talking to the network.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Send a plain text message. Parse mode is HTML.
    async fn send_text(&self, chat_id: &str, text: &str) -> Result<(), TelegramError>;

    /// Send a text message with an inline keyboard.
    async fn send_with_keyboard(
        &self,
        chat_id: &str,
        text: &str,
        reply_markup: serde_json::Value,
    ) -> Result<(), TelegramError>;
}

/// HTTP client for one bot token.
pub struct TelegramApi {
    client: reqwest::Client,
    base_url: String,
}

impl TelegramApi {
    pub fn new(bot_token: &str) -> Self {
        TelegramApi {
            client: reqwest::Client::new(),
            base_url: format!("https://api.telegram.org/bot{bot_token}"),
        }
    }

    /// Long-poll for updates.
    ///
    /// `offset` is the confirm-and-advance cursor (last update id plus
    /// one); `timeout_secs` is the server-side hold time. Only the
    /// `message` and `edited_message` channels are requested.
    pub async fn get_updates(
        &self,
        offset: Option<i64>,
        timeout_secs: u64,
    ) -> Result<Vec<Update>, TelegramError> {
        let body = serde_json::json!({
            "offset": offset,
            "timeout": timeout_secs,
            "allowed_updates": ["message", "edited_message"],
        });

        let response = self
            .client
            .post(format!("{}/getUpdates", self.base_url))
            .json(&body)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    async fn send_message(
        &self,
        chat_id: &str,
        text: &str,
        reply_markup: Option<serde_json::Value>,
    ) -> Result<(), TelegramError> {
        let mut body = serde_json::json!({
            "chat_id": chat_id,
            "text": text,
            "parse_mode": "HTML",
        });
        if let Some(markup) = reply_markup {
            body["reply_markup"] = markup;
        }

        let response = self
            .client
            .post(format!("{}/sendMessage", self.base_url))
            .json(&body)
            .send()
            .await?;

        Self::parse_response::<serde_json::Value>(response).await?;
        Ok(())
    }

    /// Decode the Bot API envelope, mapping `ok: false` and transport
    /// failures to [`TelegramError::Api`].
    async fn parse_response<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, TelegramError> {
        let status = response.status();
        let envelope: ApiResponse<T> = match response.json().await {
            Ok(envelope) => envelope,
            Err(e) if status.is_success() => return Err(TelegramError::Request(e)),
            Err(_) => {
                return Err(TelegramError::Api {
                    status: status.as_u16(),
                    description: "unreadable error response".to_string(),
                })
            }
        };

        if !envelope.ok {
            return Err(TelegramError::Api {
                status: status.as_u16(),
                description: envelope
                    .description
                    .unwrap_or_else(|| "no description".to_string()),
            });
        }

        envelope.result.ok_or(TelegramError::Api {
            status: status.as_u16(),
            description: "missing result".to_string(),
        })
    }
}

#[async_trait]
impl ChatTransport for TelegramApi {
    async fn send_text(&self, chat_id: &str, text: &str) -> Result<(), TelegramError> {
        self.send_message(chat_id, text, None).await
    }

    async fn send_with_keyboard(
        &self,
        chat_id: &str,
        text: &str,
        reply_markup: serde_json::Value,
    ) -> Result<(), TelegramError> {
        self.send_message(chat_id, text, Some(reply_markup)).await
    }
}
