//! Telegram Bot API client.
//!
//! Covers the two calls the bot needs:
//! - `sendMessage` (Markdown) for delivering summaries and replies
//! - `getUpdates` long polling for inbound chat text

use crate::dispatcher::{BoxFuture, NotificationDispatcher};
use crate::error::{DispatchError, DispatchResult};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Extra slack on top of the long-poll timeout before the HTTP call gives up.
const POLL_GRACE: Duration = Duration::from_secs(10);

/// Envelope of every Bot API response.
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    #[serde(default = "Option::default")]
    result: Option<T>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parse_mode: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct GetUpdatesRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    offset: Option<i64>,
    timeout: u64,
    allowed_updates: [&'static str; 1],
}

/// Chat an update came from.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Chat {
    pub id: i64,
}

/// Inbound chat message.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IncomingMessage {
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
}

/// One `getUpdates` item.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<IncomingMessage>,
}

impl Update {
    /// `(chat_id, text)` when the update carries a text message.
    pub fn text_message(&self) -> Option<(i64, &str)> {
        let message = self.message.as_ref()?;
        Some((message.chat.id, message.text.as_deref()?))
    }
}

/// Telegram Bot API client.
pub struct TelegramClient {
    client: Client,
    api_url: String,
    token: String,
}

impl TelegramClient {
    /// Create a client.
    ///
    /// # Arguments
    /// * `api_url` - Bot API base URL (e.g., "https://api.telegram.org")
    /// * `token` - bot token issued by BotFather
    /// * `request_timeout` - timeout for non-polling requests
    pub fn new(
        api_url: impl Into<String>,
        token: impl Into<String>,
        request_timeout: Duration,
    ) -> DispatchResult<Self> {
        let client = Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| DispatchError::HttpClient(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_url, self.token, method)
    }

    async fn call<B, T>(&self, method: &str, body: &B, timeout: Option<Duration>) -> DispatchResult<T>
    where
        B: Serialize + ?Sized,
        T: for<'de> Deserialize<'de>,
    {
        let mut request = self.client.post(self.method_url(method)).json(body);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        // Errors are re-rendered without the URL, which embeds the token
        let response = request
            .send()
            .await
            .map_err(|e| DispatchError::HttpClient(format!("{method} failed: {}", e.without_url())))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| DispatchError::HttpClient(format!("{method} body: {}", e.without_url())))?;

        parse_response(method, status.as_u16(), &bytes)
    }

    /// Send a Markdown message to `chat_id`.
    pub async fn send_message(&self, chat_id: &str, text: &str) -> DispatchResult<()> {
        if chat_id.trim().is_empty() {
            return Err(DispatchError::InvalidDestination("empty chat id".to_string()));
        }

        let request = SendMessageRequest {
            chat_id,
            text,
            parse_mode: Some("Markdown"),
        };
        let _: serde_json::Value = self.call("sendMessage", &request, None).await?;

        debug!(chat_id, chars = text.chars().count(), "Message sent");
        Ok(())
    }

    /// Long-poll for updates after `offset`.
    pub async fn get_updates(&self, offset: Option<i64>, timeout_secs: u64) -> DispatchResult<Vec<Update>> {
        let request = GetUpdatesRequest {
            offset,
            timeout: timeout_secs,
            allowed_updates: ["message"],
        };
        let timeout = Duration::from_secs(timeout_secs) + POLL_GRACE;
        self.call("getUpdates", &request, Some(timeout)).await
    }
}

impl NotificationDispatcher for TelegramClient {
    fn send<'a>(&'a self, destination: &'a str, text: &'a str) -> BoxFuture<'a, DispatchResult<()>> {
        Box::pin(self.send_message(destination, text))
    }
}

/// Decode a Bot API response body.
fn parse_response<T>(method: &str, status: u16, body: &[u8]) -> DispatchResult<T>
where
    T: for<'de> Deserialize<'de>,
{
    let envelope: ApiResponse<T> = match serde_json::from_slice(body) {
        Ok(envelope) => envelope,
        Err(e) if !(200..300).contains(&status) => {
            return Err(DispatchError::HttpClient(format!("{method}: HTTP {status}: {e}")))
        }
        Err(e) => return Err(e.into()),
    };

    if !envelope.ok {
        let reason = envelope
            .description
            .unwrap_or_else(|| format!("HTTP {status}"));
        warn!(method, status, reason = %reason, "Bot API rejected request");
        return Err(DispatchError::Rejected(reason));
    }

    envelope
        .result
        .ok_or_else(|| DispatchError::HttpClient(format!("{method}: response without result")))
}
