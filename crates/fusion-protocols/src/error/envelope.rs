//! Envelope decoding errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EnvelopeError {
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Frame is not a JSON object")]
    NotAnObject,

    #[error("Frame has no string 'type' field")]
    MissingType,
}
