//! Live channel errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("WebSocket configuration missing: no API key configured")]
    MissingApiKey,

    #[error("Invalid WebSocket endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("Not connected to WebSocket; message not sent")]
    NotConnected,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("WebSocket error: {0}")]
    WebSocket(String),

    #[error("Send failed: {0}")]
    SendFailed(String),
}
