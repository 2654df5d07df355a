//! Configuration
//!
//! Settings come from an optional JSON5 file, then `BOTPROBE_*` environment
//! variables override individual fields. The token is usually supplied only
//! through the environment.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use crate::bot::DEFAULT_API_BASE;
use crate::error::{Error, Result};
use crate::logging::LoggingSettings;
use crate::updates::ReceiverConfig;

pub const ENV_API_TOKEN: &str = "BOTPROBE_API_TOKEN";
pub const ENV_API_BASE: &str = "BOTPROBE_API_BASE";
pub const ENV_CHAT_ID: &str = "BOTPROBE_CHAT_ID";
pub const ENV_LOG_LEVEL: &str = "BOTPROBE_LOG_LEVEL";

const REDACTED: &str = "[REDACTED]";

/// Root settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Bot token, `<id>:<secret>`
    #[serde(default)]
    pub api_token: String,

    /// Bot API endpoint
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Supergroup the probes post into
    #[serde(default)]
    pub chat_id: i64,

    /// Per-request HTTP timeout
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default)]
    pub receiver: ReceiverSettings,

    #[serde(default)]
    pub logging: LoggingSettings,
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_token: String::new(),
            api_base: default_api_base(),
            chat_id: 0,
            request_timeout_secs: default_request_timeout_secs(),
            receiver: ReceiverSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

/// Update receiver tuning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiverSettings {
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
    /// How long a step waits for a human to act
    #[serde(default = "default_update_timeout_secs")]
    pub update_timeout_secs: u64,
}

fn default_backoff_ms() -> u64 {
    500
}

fn default_update_timeout_secs() -> u64 {
    30
}

impl Default for ReceiverSettings {
    fn default() -> Self {
        Self {
            backoff_ms: default_backoff_ms(),
            update_timeout_secs: default_update_timeout_secs(),
        }
    }
}

impl Settings {
    /// Parse a JSON5 document. Missing fields take their defaults.
    pub fn from_json5(raw: &str) -> Result<Self> {
        json5::from_str(raw).map_err(|e| Error::config(format!("invalid settings: {}", e)))
    }

    /// Load from `path` (or defaults), apply the environment, then validate
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with(path, |key| std::env::var(key).ok())
    }

    fn load_with(path: Option<&Path>, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut settings = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path).map_err(|e| {
                    Error::config(format!("cannot read {}: {}", path.display(), e))
                })?;
                Self::from_json5(&raw)?
            }
            None => Self::default(),
        };
        settings.apply_env(lookup)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Override fields from `BOTPROBE_*` variables
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result {
        if let Some(token) = lookup(ENV_API_TOKEN) {
            self.api_token = token;
        }
        if let Some(base) = lookup(ENV_API_BASE) {
            self.api_base = base;
        }
        if let Some(chat) = lookup(ENV_CHAT_ID) {
            self.chat_id = chat.trim().parse().map_err(|_| {
                Error::config(format!("{} must be an integer, got '{}'", ENV_CHAT_ID, chat))
            })?;
        }
        if let Some(level) = lookup(ENV_LOG_LEVEL) {
            self.logging.level = level;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result {
        if self.api_token.trim().is_empty() {
            return Err(Error::config(format!(
                "apiToken is required (or set {})",
                ENV_API_TOKEN
            )));
        }
        if self.chat_id == 0 {
            return Err(Error::config(format!(
                "chatId is required (or set {})",
                ENV_CHAT_ID
            )));
        }
        Url::parse(&self.api_base)
            .map_err(|e| Error::config(format!("invalid apiBase '{}': {}", self.api_base, e)))?;
        if self.request_timeout_secs == 0 {
            return Err(Error::config("requestTimeoutSecs must be non-zero"));
        }
        self.receiver_config().validate()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn receiver_config(&self) -> ReceiverConfig {
        ReceiverConfig {
            backoff: Duration::from_millis(self.receiver.backoff_ms),
            default_timeout: Duration::from_secs(self.receiver.update_timeout_secs),
        }
    }

    /// Settings as JSON with the token masked
    pub fn redacted(&self) -> Result<Value> {
        let mut value = serde_json::to_value(self)
            .map_err(|e| Error::config(format!("cannot serialize settings: {}", e)))?;
        if let Some(token) = value.get_mut("apiToken") {
            *token = Value::String(REDACTED.to_string());
        }
        Ok(value)
    }
}
