//! Error types for the Fusion protocol layer.

mod channel;
mod envelope;

pub use channel::*;
pub use envelope::*;
