//! # Fusion Protocols
//!
//! Shared wire-level definitions for the Fusion live client.
//! Contains only data types and decoding - no I/O.
//!
//! ## Contents
//!
//! - [`Envelope`] - the `{ type, payload }` frame exchanged over the live socket
//! - [`FusionEvent`] - typed decoding of the inbound envelopes the dashboard understands
//! - [`CloseInfo`] - WebSocket close code/reason/cleanliness as reported by a transport
//! - [`types`] - chat, message, hint and advisor view-model records
//! - [`error`] - channel and envelope errors

pub mod close;
pub mod envelope;
pub mod error;
pub mod events;
pub mod types;

pub use close::{close_code, CloseInfo};
pub use envelope::Envelope;
pub use error::{ChannelError, EnvelopeError};
pub use events::{kinds, FusionEvent};
pub use types::*;
