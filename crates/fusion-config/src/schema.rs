//! Configuration schema definitions.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub live: LiveConfig,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub hints: HintsConfig,

    #[serde(default)]
    pub app: AppConfig,
}

/// Live update socket configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct LiveConfig {
    /// Socket endpoint without query string.
    #[serde(default = "default_ws_base_url")]
    pub base_url: String,

    /// Static key appended as `?apiKey=`; absent means the channel never connects.
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_max_reconnect_attempts")]
    pub max_reconnect_attempts: u32,

    /// First reconnect delay; doubles on every further attempt.
    #[serde(default = "default_reconnect_base_delay_ms")]
    pub reconnect_base_delay_ms: u64,

    /// Per-subscriber event queue depth.
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
}

impl LiveConfig {
    pub fn reconnect_base_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_base_delay_ms)
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            base_url: default_ws_base_url(),
            api_key: None,
            max_reconnect_attempts: default_max_reconnect_attempts(),
            reconnect_base_delay_ms: default_reconnect_base_delay_ms(),
            event_buffer: default_event_buffer(),
        }
    }
}

// The key must never end up in logs, including `{:?}` of the config.
impl fmt::Debug for LiveConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LiveConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("max_reconnect_attempts", &self.max_reconnect_attempts)
            .field("reconnect_base_delay_ms", &self.reconnect_base_delay_ms)
            .field("event_buffer", &self.event_buffer)
            .finish()
    }
}

fn default_ws_base_url() -> String {
    "ws://localhost:8000/ws/updates".to_string()
}

fn default_max_reconnect_attempts() -> u32 {
    5
}

fn default_reconnect_base_delay_ms() -> u64 {
    5000
}

fn default_event_buffer() -> usize {
    256
}

/// REST API configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_api_base_url")]
    pub base_url: String,

    /// Bearer token issued by `/auth/login`.
    #[serde(default)]
    pub token: Option<String>,

    #[serde(default = "default_chat_page_limit")]
    pub chat_page_limit: u32,

    #[serde(default = "default_message_page_limit")]
    pub message_page_limit: u32,

    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_api_base_url(),
            token: None,
            chat_page_limit: default_chat_page_limit(),
            message_page_limit: default_message_page_limit(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

impl fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiConfig")
            .field("base_url", &self.base_url)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("chat_page_limit", &self.chat_page_limit)
            .field("message_page_limit", &self.message_page_limit)
            .field("timeout_seconds", &self.timeout_seconds)
            .finish()
    }
}

fn default_api_base_url() -> String {
    "http://localhost:8000/api/v1".to_string()
}

fn default_chat_page_limit() -> u32 {
    50
}

fn default_message_page_limit() -> u32 {
    100
}

fn default_timeout_seconds() -> u64 {
    30
}

/// Hints panel configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HintsConfig {
    #[serde(default = "default_max_hints")]
    pub max_hints: usize,
}

impl Default for HintsConfig {
    fn default() -> Self {
        Self {
            max_hints: default_max_hints(),
        }
    }
}

fn default_max_hints() -> usize {
    10
}

/// Local application state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Where the view-mode store is persisted (default `~/.fusion/app-state.json`).
    #[serde(default)]
    pub state_file: Option<PathBuf>,
}

impl AppConfig {
    pub fn state_file(&self) -> PathBuf {
        match &self.state_file {
            Some(path) => PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).as_ref()),
            None => fusion_dir().join("app-state.json"),
        }
    }
}

/// Get the ~/.fusion directory path.
pub fn fusion_dir() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".fusion"))
        .unwrap_or_else(|| PathBuf::from(".fusion"))
}
