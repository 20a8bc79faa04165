//! # Fusion Views
//!
//! Consumers of the live update channel. Each view owns its slice of
//! dashboard state and folds decoded events into it idempotently; the
//! [`Dashboard`] decodes every inbound event once and hands it to all of
//! them.

mod chat_list;
mod command_history;
mod connection;
mod dashboard;
mod error;
mod hints;
mod message_view;
mod recent;
mod reducer;
mod view_mode;

pub use chat_list::{ChatListView, PREVIEW_CHARS, preview};
pub use command_history::{CommandHistory, CommandItem, CommandItemKind};
pub use connection::{ConnectionIndicator, ConnectionLabel};
pub use dashboard::{Dashboard, DashboardConfig};
pub use error::ViewError;
pub use hints::{DEFAULT_MAX_HINTS, Hint, HintsPanel};
pub use message_view::MessageView;
pub use reducer::EventReducer;
pub use view_mode::{ViewMode, ViewModeStore};
