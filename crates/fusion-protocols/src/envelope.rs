//! The `{ type, payload }` frame used in both directions on the live socket.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::EnvelopeError;

/// A decoded live-socket frame.
///
/// Inbound frames must be JSON objects carrying a string `type`; a missing
/// `payload` decodes as `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub payload: Value,
}

impl Envelope {
    pub fn new(kind: impl Into<String>, payload: Value) -> Self {
        Self {
            kind: kind.into(),
            payload,
        }
    }

    /// Parse a text frame.
    pub fn parse(text: &str) -> Result<Self, EnvelopeError> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(value)
    }

    /// Validate an already-parsed JSON value.
    pub fn from_value(value: Value) -> Result<Self, EnvelopeError> {
        let Value::Object(mut fields) = value else {
            return Err(EnvelopeError::NotAnObject);
        };
        let kind = match fields.remove("type") {
            Some(Value::String(kind)) => kind,
            _ => return Err(EnvelopeError::MissingType),
        };
        let payload = fields.remove("payload").unwrap_or(Value::Null);
        Ok(Self { kind, payload })
    }

    /// Read a string field of the payload.
    pub fn payload_str(&self, field: &str) -> Option<&str> {
        self.payload.get(field).and_then(Value::as_str)
    }
}
