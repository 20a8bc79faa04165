//! View error types.

use thiserror::Error;

/// Errors from view-model persistence.
#[derive(Debug, Error)]
pub enum ViewError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid state file: {0}")]
    Json(#[from] serde_json::Error),
}
