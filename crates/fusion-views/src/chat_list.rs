//! WhatsApp chat list.

use std::cmp::Ordering;

use tracing::debug;

use fusion_protocols::{Chat, ChatMessage, ChatModeUpdate, FusionEvent, parse_timestamp};

use crate::recent::RecentSet;
use crate::reducer::EventReducer;

/// Characters of message text shown in the list.
pub const PREVIEW_CHARS: usize = 30;

const SEEN_MESSAGES: usize = 1024;

/// First [`PREVIEW_CHARS`] characters, with `...` when cut.
pub fn preview(content: &str) -> String {
    let mut chars = content.chars();
    let head: String = chars.by_ref().take(PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}

/// Chats ordered most recent first, with unread counters.
#[derive(Debug)]
pub struct ChatListView {
    chats: Vec<Chat>,
    selected: Option<String>,
    seen: RecentSet<String>,
}

impl Default for ChatListView {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatListView {
    pub fn new() -> Self {
        Self {
            chats: Vec::new(),
            selected: None,
            seen: RecentSet::new(SEEN_MESSAGES),
        }
    }

    pub fn chats(&self) -> &[Chat] {
        &self.chats
    }

    pub fn get(&self, chat_id: &str) -> Option<&Chat> {
        self.chats.iter().find(|c| c.id == chat_id)
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn total_unread(&self) -> u32 {
        self.chats.iter().map(|c| c.unread_count).sum()
    }

    /// Replace the list with a REST page, keeping chats that only live
    /// events know about yet.
    pub fn load_snapshot(&mut self, snapshot: Vec<Chat>) {
        let live_only: Vec<Chat> = self
            .chats
            .drain(..)
            .filter(|chat| !snapshot.iter().any(|c| c.id == chat.id))
            .collect();

        debug!(
            snapshot = snapshot.len(),
            live_only = live_only.len(),
            "Loading chat list snapshot"
        );

        self.chats = live_only;
        self.chats.extend(snapshot);

        if let Some(selected) = self.selected.clone() {
            self.clear_unread(&selected);
        }
    }

    /// Select a chat and mark it read. Returns whether anything changed.
    pub fn select(&mut self, chat_id: &str) -> bool {
        if self.selected.as_deref() == Some(chat_id) {
            return false;
        }
        self.selected = Some(chat_id.to_string());
        self.clear_unread(chat_id);
        true
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    fn clear_unread(&mut self, chat_id: &str) {
        if let Some(chat) = self.chats.iter_mut().find(|c| c.id == chat_id) {
            chat.unread_count = 0;
        }
    }

    fn apply_message(&mut self, message: &ChatMessage) -> bool {
        if message.chat_id.is_empty() || !self.seen.insert(message.id.clone()) {
            return false;
        }

        let chat_id = message.chat_id.as_str();
        let from_contact = message.sender_id.as_deref() == Some(chat_id);
        let is_selected = self.selected.as_deref() == Some(chat_id);

        let mut chat = match self.chats.iter().position(|c| c.id == chat_id) {
            Some(index) => {
                let mut chat = self.chats.remove(index);
                if from_contact && !is_selected {
                    chat.unread_count += 1;
                }
                chat
            }
            None => {
                let mut chat = Chat::new(chat_id);
                chat.unread_count = u32::from(from_contact);
                chat
            }
        };

        chat.contact_id = Some(chat_id.to_string());
        chat.contact_name = message
            .contact_name()
            .map(str::to_string)
            .or(chat.contact_name.take())
            .or_else(|| Some(chat_id.to_string()));
        if let Some(content) = message.content.as_deref() {
            chat.last_message_preview = Some(preview(content));
        }
        if message.timestamp.is_some() {
            chat.last_message_ts = message.timestamp.clone();
        }
        chat.status = Some("open".to_string());

        self.chats.sort_by(by_recency);
        self.chats.insert(0, chat);
        true
    }

    fn apply_mode(&mut self, update: &ChatModeUpdate) -> bool {
        match self.chats.iter_mut().find(|c| c.id == update.chat_id) {
            Some(chat) if chat.mode != update.new_mode => {
                debug!(chat_id = %update.chat_id, mode = %update.new_mode, "Chat mode changed");
                chat.mode = update.new_mode.clone();
                true
            }
            _ => false,
        }
    }
}

/// Newest `last_message_ts` first; chats without one sink to the bottom.
fn by_recency(a: &Chat, b: &Chat) -> Ordering {
    let a_ts = a.last_message_ts.as_deref().and_then(parse_timestamp);
    let b_ts = b.last_message_ts.as_deref().and_then(parse_timestamp);
    b_ts.cmp(&a_ts)
}

impl EventReducer for ChatListView {
    fn name(&self) -> &'static str {
        "chat_list"
    }

    fn reduce(&mut self, event: &FusionEvent) -> bool {
        match event {
            FusionEvent::NewMessage(message) => self.apply_message(message),
            FusionEvent::ChatModeUpdate(update) => self.apply_mode(update),
            // Status changes do not show in the list.
            _ => false,
        }
    }
}

#[cfg(test)]
#[path = "chat_list_tests.rs"]
mod tests;
