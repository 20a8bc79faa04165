//! WhatsApp chat and message records.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Delivery status of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageStatus {
    PendingQueue,
    PendingSend,
    Sent,
    Delivered,
    Read,
    FailedSend,
    AgentError,
    FailedSystem,
    #[serde(other)]
    Unknown,
}

impl MessageStatus {
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::PendingQueue | Self::PendingSend)
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::FailedSend | Self::AgentError | Self::FailedSystem)
    }
}

/// A single message in a chat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    #[serde(default)]
    pub chat_id: String,
    #[serde(default)]
    pub sender_id: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub status: Option<MessageStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_timestamp: Option<String>,
    #[serde(rename = "type", default = "default_message_type")]
    pub message_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcription: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
}

fn default_message_type() -> String {
    "text".to_string()
}

impl ChatMessage {
    /// Create a plain text message.
    pub fn text(id: impl Into<String>, chat_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            chat_id: chat_id.into(),
            sender_id: None,
            content: Some(content.into()),
            timestamp: None,
            status: None,
            status_timestamp: None,
            message_type: default_message_type(),
            transcription: None,
            metadata: HashMap::new(),
        }
    }

    pub fn with_sender(mut self, sender_id: impl Into<String>) -> Self {
        self.sender_id = Some(sender_id.into());
        self
    }

    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = Some(timestamp.into());
        self
    }

    /// Sent by our side: an employee, the agent, or the auto responder.
    pub fn is_own(&self) -> bool {
        match self.sender_id.as_deref() {
            Some(sender) => {
                sender.starts_with("employee:") || sender == "agent" || sender == "auto_responder"
            }
            None => false,
        }
    }

    /// Contact display name carried in message metadata, if any.
    pub fn contact_name(&self) -> Option<&str> {
        self.metadata.get("contact_name").and_then(Value::as_str)
    }
}

/// Status change for a previously sent message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageStatusUpdate {
    pub id: String,
    pub chat_id: String,
    pub status: MessageStatus,
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// A chat (conversation with one WhatsApp contact) in the chat list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chat {
    /// The contact's WhatsApp id doubles as the chat id.
    pub id: String,
    #[serde(default)]
    pub contact_id: Option<String>,
    #[serde(default)]
    pub contact_name: Option<String>,
    #[serde(default)]
    pub last_message_preview: Option<String>,
    #[serde(default)]
    pub last_message_ts: Option<String>,
    #[serde(default)]
    pub unread_count: u32,
    #[serde(default = "default_chat_mode")]
    pub mode: String,
    #[serde(default)]
    pub status: Option<String>,
}

/// Mode a chat starts in until the server says otherwise.
pub const DEFAULT_CHAT_MODE: &str = "human";

fn default_chat_mode() -> String {
    DEFAULT_CHAT_MODE.to_string()
}

impl Chat {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            contact_id: None,
            contact_name: None,
            last_message_preview: None,
            last_message_ts: None,
            unread_count: 0,
            mode: default_chat_mode(),
            status: None,
        }
    }

    /// Name to show: contact name, falling back to the WhatsApp id.
    pub fn display_name(&self) -> &str {
        self.contact_name.as_deref().unwrap_or(&self.id)
    }
}

/// Human/agent handover for a chat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatModeUpdate {
    pub chat_id: String,
    pub new_mode: String,
}
