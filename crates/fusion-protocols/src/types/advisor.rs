//! Advisor assistant records: command progress, conversations, gateway calls.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Progress report for a long-running advisor command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandUpdate {
    pub job_id: String,
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub details: Option<Value>,
}

impl CommandUpdate {
    /// Status of an intermediate step; any other status is final for the step list.
    pub const EXECUTING_STEP: &'static str = "executing_step";

    pub fn is_intermediate(&self) -> bool {
        self.status == Self::EXECUTING_STEP
    }
}

/// A stored advisor conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub messages: Vec<AdvisorMessage>,
}

/// One turn in an advisor conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvisorMessage {
    #[serde(default)]
    pub id: Option<String>,
    pub role: String,
    #[serde(default)]
    pub content: Value,
}

/// How the gateway should interpret a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestType {
    NaturalLanguage,
    Structured,
}

/// Body of `POST /gateway/process`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayRequest {
    pub conversation_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub request_type: RequestType,
    pub payload: Value,
    #[serde(default)]
    pub context: Value,
}

impl GatewayRequest {
    /// Free text typed by the user.
    pub fn natural_language(conversation_id: Option<String>, text: impl Into<String>) -> Self {
        Self {
            conversation_id,
            user_id: None,
            request_type: RequestType::NaturalLanguage,
            payload: json!({ "text": text.into() }),
            context: json!({}),
        }
    }

    /// A structured intent, as produced by a hint action.
    pub fn structured(
        conversation_id: Option<String>,
        intent: impl Into<String>,
        parameters: Value,
    ) -> Self {
        Self {
            conversation_id,
            user_id: None,
            request_type: RequestType::Structured,
            payload: json!({ "intent": intent.into(), "parameters": parameters }),
            context: json!({}),
        }
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }
}

/// Reply of `POST /gateway/process`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayResponse {
    #[serde(default)]
    pub conversation_id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub response_type: Option<String>,
    #[serde(default)]
    pub payload: Value,
    #[serde(default)]
    pub follow_up_actions: Vec<Value>,
    #[serde(default)]
    pub explanation: Option<String>,
    #[serde(default)]
    pub suggested_emotion: Option<String>,
}

impl GatewayResponse {
    /// Text to show for the assistant turn.
    pub fn display_text(&self) -> String {
        match self.response_type.as_deref() {
            Some("natural_language_text") => self
                .payload
                .get("text")
                .and_then(Value::as_str)
                .unwrap_or("[empty response]")
                .to_string(),
            Some("structured_data") => match self.payload.get("data") {
                Some(Value::String(s)) => s.clone(),
                Some(Value::Null) | None => "[empty structured data]".to_string(),
                Some(other) => other.to_string(),
            },
            Some("error_message") => {
                let message = self
                    .payload
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("Unknown error");
                match self.payload.get("details").and_then(Value::as_str) {
                    Some(details) => format!("Error: {}\n\n{}", message, details),
                    None => format!("Error: {}", message),
                }
            }
            _ => self.payload.to_string(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.response_type.as_deref() == Some("error_message")
    }
}
