//! Messages of the selected chat.

use tracing::{debug, trace};

use fusion_protocols::{ChatMessage, FusionEvent, MessageStatusUpdate};

use crate::recent::RecentMap;
use crate::reducer::EventReducer;

/// Status updates held for messages that have not arrived yet.
const PENDING_STATUSES: usize = 256;

/// Conversation pane for one chat.
#[derive(Debug)]
pub struct MessageView {
    chat_id: Option<String>,
    messages: Vec<ChatMessage>,
    pending: RecentMap<String, MessageStatusUpdate>,
}

impl Default for MessageView {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageView {
    pub fn new() -> Self {
        Self {
            chat_id: None,
            messages: Vec::new(),
            pending: RecentMap::new(PENDING_STATUSES),
        }
    }

    pub fn chat_id(&self) -> Option<&str> {
        self.chat_id.as_deref()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn get(&self, message_id: &str) -> Option<&ChatMessage> {
        self.messages.iter().find(|m| m.id == message_id)
    }

    /// Switch to `chat_id`, dropping the previous chat's messages.
    pub fn open(&mut self, chat_id: &str) {
        if self.chat_id.as_deref() == Some(chat_id) {
            return;
        }
        self.chat_id = Some(chat_id.to_string());
        self.messages.clear();
        self.pending.clear();
    }

    pub fn close(&mut self) {
        self.chat_id = None;
        self.messages.clear();
        self.pending.clear();
    }

    /// Merge the REST history for `chat_id`.
    ///
    /// History order is kept; live messages it does not contain are
    /// appended after it. A snapshot for a chat that is no longer open is
    /// discarded.
    pub fn load_snapshot(&mut self, chat_id: &str, history: Vec<ChatMessage>) -> bool {
        if self.chat_id.as_deref() != Some(chat_id) {
            debug!(chat_id, "Discarding history for a chat that is not open");
            return false;
        }

        let live_only: Vec<ChatMessage> = self
            .messages
            .drain(..)
            .filter(|live| !history.iter().any(|m| m.id == live.id))
            .collect();

        self.messages = history;
        self.messages.extend(live_only);

        let ids: Vec<String> = self.messages.iter().map(|m| m.id.clone()).collect();
        for id in ids {
            if let Some(update) = self.pending.remove(&id) {
                self.patch(&update);
            }
        }
        true
    }

    fn is_open(&self, chat_id: &str) -> bool {
        self.chat_id.as_deref() == Some(chat_id)
    }

    fn apply_message(&mut self, message: &ChatMessage) -> bool {
        if !self.is_open(&message.chat_id) {
            return false;
        }
        if self.messages.iter().any(|m| m.id == message.id) {
            trace!(message_id = %message.id, "Duplicate message ignored");
            return false;
        }

        let mut message = message.clone();
        if let Some(update) = self.pending.remove(&message.id) {
            message.status = Some(update.status);
            message.status_timestamp = update.timestamp;
        }
        self.messages.push(message);
        true
    }

    fn apply_status(&mut self, update: &MessageStatusUpdate) -> bool {
        if !self.is_open(&update.chat_id) {
            return false;
        }
        if self.messages.iter().any(|m| m.id == update.id) {
            return self.patch(update);
        }

        debug!(message_id = %update.id, "Status for unknown message parked");
        self.pending.insert(update.id.clone(), update.clone());
        false
    }

    fn patch(&mut self, update: &MessageStatusUpdate) -> bool {
        match self.messages.iter_mut().find(|m| m.id == update.id) {
            Some(message)
                if message.status != Some(update.status)
                    || message.status_timestamp != update.timestamp =>
            {
                message.status = Some(update.status);
                message.status_timestamp = update.timestamp.clone();
                true
            }
            _ => false,
        }
    }
}

impl EventReducer for MessageView {
    fn name(&self) -> &'static str {
        "message_view"
    }

    fn reduce(&mut self, event: &FusionEvent) -> bool {
        match event {
            FusionEvent::NewMessage(message) => self.apply_message(message),
            FusionEvent::MessageStatus(update) => self.apply_status(update),
            _ => false,
        }
    }
}

#[cfg(test)]
#[path = "message_view_tests.rs"]
mod tests;
