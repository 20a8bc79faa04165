//! Connection status shown in the dashboard header.

use std::fmt;

use serde::Serialize;

use fusion_channel::{ChannelSnapshot, ConnectionPhase};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionLabel {
    Connected,
    Connecting,
    Reconnecting,
    Disconnected,
}

impl fmt::Display for ConnectionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Connected => "connected",
            Self::Connecting => "connecting",
            Self::Reconnecting => "reconnecting",
            Self::Disconnected => "disconnected",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionIndicator {
    pub connected: bool,
    pub label: ConnectionLabel,
    pub error: Option<String>,
}

impl ConnectionIndicator {
    pub fn from_snapshot(snapshot: &ChannelSnapshot) -> Self {
        // A socket opened by a reconnect timer is still "reconnecting".
        let label = match snapshot.phase {
            ConnectionPhase::Connected => ConnectionLabel::Connected,
            ConnectionPhase::Connecting if snapshot.reconnect_attempts > 0 => {
                ConnectionLabel::Reconnecting
            }
            ConnectionPhase::Connecting => ConnectionLabel::Connecting,
            ConnectionPhase::ReconnectPending => ConnectionLabel::Reconnecting,
            ConnectionPhase::Disconnected => ConnectionLabel::Disconnected,
        };

        Self {
            connected: snapshot.is_connected,
            label,
            error: snapshot.last_error.clone(),
        }
    }
}

impl From<&ChannelSnapshot> for ConnectionIndicator {
    fn from(snapshot: &ChannelSnapshot) -> Self {
        Self::from_snapshot(snapshot)
    }
}

impl fmt::Display for ConnectionIndicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.error {
            Some(error) => write!(f, "{} ({})", self.label, error),
            None => write!(f, "{}", self.label),
        }
    }
}
