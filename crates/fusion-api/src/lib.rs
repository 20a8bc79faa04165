//! # Fusion API
//!
//! HTTP client for the Fusion backend. Supplies the REST snapshots the
//! live channel patches, plus login, outbound WhatsApp messages and the
//! advisor gateway.

pub mod client;
pub mod error;
pub mod types;

pub use client::ApiClient;
pub use error::ApiError;
pub use types::{SendReceipt, TokenResponse, User};
