//! Bot API Client
//!
//! Thin JSON-over-HTTP client for the handful of Bot API methods the probes
//! drive, plus the `getUpdates` event source.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;
use url::Url;

use super::envelope;
use crate::error::{Error, Result};
use crate::updates::{EventSource, Message, PollSnapshot, Update, UpdateKind, User};

/// Public Bot API endpoint
pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";

/// Update kinds requested from `getUpdates`, so the cursor sees everything
/// the receiver can classify.
const REQUESTED_KINDS: [UpdateKind; 6] = [
    UpdateKind::Message,
    UpdateKind::EditedMessage,
    UpdateKind::ChannelPost,
    UpdateKind::Poll,
    UpdateKind::PollAnswer,
    UpdateKind::CallbackQuery,
];

#[derive(Serialize)]
struct InputPollOption<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct SendPollRequest<'a> {
    chat_id: i64,
    question: &'a str,
    options: Vec<InputPollOption<'a>>,
}

#[derive(Serialize)]
struct StopPollRequest {
    chat_id: i64,
    message_id: i64,
}

#[derive(Serialize)]
struct SendMessageRequest<'a> {
    chat_id: i64,
    text: &'a str,
}

#[derive(Serialize)]
struct GetUpdatesRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    offset: Option<i64>,
    timeout: u32,
    allowed_updates: Vec<&'static str>,
}

#[derive(Serialize)]
struct Empty {}

/// Bot API client. Cheap to clone; clones share the connection pool.
#[derive(Clone)]
pub struct BotClient {
    client: reqwest::Client,
    base: Url,
    token: String,
}

impl fmt::Debug for BotClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BotClient")
            .field("base", &self.base.as_str())
            .field("token", &"[REDACTED]")
            .finish()
    }
}

impl BotClient {
    /// Create a client for `api_base` (e.g. [`DEFAULT_API_BASE`]).
    pub fn new(token: impl Into<String>, api_base: &str, request_timeout: Duration) -> Result<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(Error::config("bot token is required"));
        }

        let base = Url::parse(api_base)
            .map_err(|e| Error::config(format!("invalid API base '{}': {}", api_base, e)))?;
        if base.cannot_be_a_base() {
            return Err(Error::config(format!("invalid API base '{}'", api_base)));
        }

        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| Error::config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base,
            token,
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!(
            "{}/bot{}/{}",
            self.base.as_str().trim_end_matches('/'),
            self.token,
            method
        )
    }

    /// POST `body` to `method` and unwrap the response envelope
    async fn call<B, T>(&self, method: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        debug!(method, "calling Bot API");

        let response = self
            .client
            .post(self.method_url(method))
            .json(body)
            .send()
            .await
            .map_err(|e| Error::transport(format!("{}: {}", method, e.without_url())))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| Error::transport(format!("{}: {}", method, e.without_url())))?;

        envelope::decode(method, status, &text)
    }

    /// The bot's own account. Cheap token check before a run.
    pub async fn get_me(&self) -> Result<User> {
        self.call("getMe", &Empty {}).await
    }

    /// Send a regular poll. Fails with [`Error::InvalidRequest`] when the
    /// server rejects it (e.g. fewer than two options).
    pub async fn send_poll(&self, chat_id: i64, question: &str, options: &[&str]) -> Result<Message> {
        let request = SendPollRequest {
            chat_id,
            question,
            options: options
                .iter()
                .map(|text| InputPollOption { text: *text })
                .collect(),
        };
        self.call("sendPoll", &request).await
    }

    /// Close a poll. The returned snapshot has `is_closed` set.
    pub async fn stop_poll(&self, chat_id: i64, message_id: i64) -> Result<PollSnapshot> {
        self.call(
            "stopPoll",
            &StopPollRequest {
                chat_id,
                message_id,
            },
        )
        .await
    }

    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<Message> {
        self.call("sendMessage", &SendMessageRequest { chat_id, text })
            .await
    }

    /// Tell the humans in `chat_id` what to do for the current step
    pub async fn send_test_case_notification(
        &self,
        chat_id: i64,
        title: &str,
        instructions: &str,
    ) -> Result<Message> {
        self.send_message(chat_id, &notification_text(title, instructions))
            .await
    }

    /// Short-poll `getUpdates` from `offset`
    pub async fn get_updates(&self, offset: Option<i64>) -> Result<Vec<Update>> {
        let request = GetUpdatesRequest {
            offset,
            timeout: 0,
            allowed_updates: REQUESTED_KINDS
                .iter()
                .filter_map(|k| k.wire_name())
                .collect(),
        };
        self.call("getUpdates", &request).await
    }
}

#[async_trait]
impl EventSource for BotClient {
    async fn fetch_since(&self, cursor: Option<i64>) -> Result<Vec<Update>> {
        // The server confirms (and drops) everything below `offset`
        self.get_updates(cursor.map(|c| c + 1)).await
    }
}

/// Banner sent before a step that needs a human to act
pub fn notification_text(title: &str, instructions: &str) -> String {
    format!("Test case: {}\n\n{}", title, instructions)
}
