//! Typed decoding of inbound live events.
//!
//! The channel itself is type-agnostic: it publishes every [`Envelope`].
//! Consumers decode once with [`FusionEvent::from_envelope`] and match on the
//! variants they own, ignoring the rest.

use serde::de::DeserializeOwned;

use crate::envelope::Envelope;
use crate::types::{ChatMessage, ChatModeUpdate, CommandUpdate, HintPayload, MessageStatusUpdate};

#[cfg(test)]
#[path = "events_tests.rs"]
mod tests;

/// Envelope `type` values understood by the dashboard.
pub mod kinds {
    pub const NEW_WHATSAPP_MESSAGE: &str = "new_whatsapp_message";
    pub const WHATSAPP_MESSAGE_STATUS: &str = "whatsapp_message_status";
    pub const WHATSAPP_CHAT_MODE_UPDATE: &str = "whatsapp_chat_mode_update";
    pub const FUSION_HINT: &str = "fusion_hint";
    pub const AGENT_COMMAND_UPDATE: &str = "agent_command_update";
}

/// A decoded inbound event.
#[derive(Debug, Clone, PartialEq)]
pub enum FusionEvent {
    NewMessage(ChatMessage),
    MessageStatus(MessageStatusUpdate),
    ChatModeUpdate(ChatModeUpdate),
    Hint(HintPayload),
    CommandUpdate(CommandUpdate),
    /// A type nobody in this client consumes.
    Unknown { kind: String },
    /// A known type whose payload did not decode.
    Invalid { kind: String, reason: String },
}

impl FusionEvent {
    pub fn from_envelope(envelope: &Envelope) -> Self {
        match envelope.kind.as_str() {
            kinds::NEW_WHATSAPP_MESSAGE => decode(envelope, FusionEvent::NewMessage),
            kinds::WHATSAPP_MESSAGE_STATUS => decode(envelope, FusionEvent::MessageStatus),
            kinds::WHATSAPP_CHAT_MODE_UPDATE => decode(envelope, FusionEvent::ChatModeUpdate),
            kinds::FUSION_HINT => decode(envelope, FusionEvent::Hint),
            kinds::AGENT_COMMAND_UPDATE => decode(envelope, FusionEvent::CommandUpdate),
            other => FusionEvent::Unknown {
                kind: other.to_string(),
            },
        }
    }

    /// The envelope type this event came from.
    pub fn kind(&self) -> &str {
        match self {
            FusionEvent::NewMessage(_) => kinds::NEW_WHATSAPP_MESSAGE,
            FusionEvent::MessageStatus(_) => kinds::WHATSAPP_MESSAGE_STATUS,
            FusionEvent::ChatModeUpdate(_) => kinds::WHATSAPP_CHAT_MODE_UPDATE,
            FusionEvent::Hint(_) => kinds::FUSION_HINT,
            FusionEvent::CommandUpdate(_) => kinds::AGENT_COMMAND_UPDATE,
            FusionEvent::Unknown { kind } | FusionEvent::Invalid { kind, .. } => kind,
        }
    }

    /// Chat the event is scoped to, if any.
    pub fn chat_id(&self) -> Option<&str> {
        match self {
            FusionEvent::NewMessage(msg) => Some(&msg.chat_id),
            FusionEvent::MessageStatus(update) => Some(&update.chat_id),
            FusionEvent::ChatModeUpdate(update) => Some(&update.chat_id),
            _ => None,
        }
    }
}

fn decode<T: DeserializeOwned>(envelope: &Envelope, wrap: fn(T) -> FusionEvent) -> FusionEvent {
    match serde_json::from_value::<T>(envelope.payload.clone()) {
        Ok(payload) => wrap(payload),
        Err(e) => FusionEvent::Invalid {
            kind: envelope.kind.clone(),
            reason: e.to_string(),
        },
    }
}
