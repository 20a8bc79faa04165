//! Response bodies that only the REST client sees.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of a successful `POST /auth/login`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

/// The signed-in employee, from `GET /users/me`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Value,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub profile: Option<Value>,
}

impl User {
    /// Id as a string, whatever JSON type the backend used.
    pub fn id_string(&self) -> String {
        match &self.id {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }

    pub fn display_name(&self) -> &str {
        self.profile
            .as_ref()
            .and_then(|p| p.get("first_name"))
            .and_then(Value::as_str)
            .or(self.username.as_deref())
            .unwrap_or("Usuário")
    }
}

/// Body of `POST /whatsapp/send`.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct SendRequest<'a> {
    pub recipient_wa_id: &'a str,
    pub content: &'a str,
}

/// Reply to `POST /whatsapp/send`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SendReceipt {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub internal_message_id: Option<Value>,
    #[serde(default)]
    pub details: Option<String>,
}

impl SendReceipt {
    pub const QUEUED: &'static str = "queued";

    pub fn is_queued(&self) -> bool {
        self.status.as_deref() == Some(Self::QUEUED)
    }
}
