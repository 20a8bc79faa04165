//! # Fusion Config
//!
//! Configuration management for the Fusion live client: the live socket
//! endpoint and static API key, the REST base URL, and view limits.

mod error;
mod loader;
mod schema;
mod validator;

pub use error::ConfigError;
pub use loader::{ConfigLoader, ENV_API_BASE_URL, ENV_API_TOKEN, ENV_STATIC_API_KEY, ENV_WS_BASE_URL};
pub use schema::*;
pub use validator::{ConfigValidator, ValidationError, ValidationResult, ValidationWarning};
