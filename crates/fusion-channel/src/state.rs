//! Connection state machine for the live update channel.
//!
//! Every transition is a plain method returning the side effects the driver
//! has to perform, so the reconnect rules are exercised without a socket or
//! a clock.

use std::fmt;
use std::time::Duration;

use serde::Serialize;

use fusion_config::LiveConfig;
use fusion_protocols::{ChannelError, CloseInfo};

/// Close reason sent when the user tears the channel down.
pub const USER_DISCONNECT_REASON: &str = "User initiated disconnect";

/// Where the channel is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionPhase {
    /// No socket and no reconnect scheduled.
    #[default]
    Disconnected,
    /// Socket created, handshake not yet complete.
    Connecting,
    Connected,
    /// Socket lost; a reconnect timer is armed.
    ReconnectPending,
}

impl ConnectionPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::ReconnectPending => "reconnect_pending",
        }
    }

    /// A socket or a reconnect timer exists.
    pub fn is_active(&self) -> bool {
        !matches!(self, Self::Disconnected)
    }
}

impl fmt::Display for ConnectionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why the channel stopped trying to connect on its own.
///
/// Only an explicit `connect()` leaves a terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum TerminalReason {
    MissingApiKey,
    InvalidEndpoint,
    /// Server closed with 1008 or 1011.
    Rejected { code: u16 },
    RetriesExhausted,
    /// A reconnect was due but no timer could be armed.
    ReconnectUnavailable,
}

/// Reconnect budget and backoff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_millis(5000),
        }
    }
}

impl ReconnectPolicy {
    pub fn from_config(config: &LiveConfig) -> Self {
        Self {
            max_attempts: config.max_reconnect_attempts,
            base_delay: config.reconnect_base_delay(),
        }
    }

    /// Delay before reconnect attempt `attempt` (1-based): `base * 2^(attempt-1)`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        self.base_delay.saturating_mul(1u32 << exponent)
    }
}

/// Side effect requested by a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    OpenSocket,
    ScheduleReconnect { attempt: u32, delay: Duration },
    CancelReconnect,
    CloseSocket { code: u16, reason: &'static str },
}

/// The channel's connection state.
#[derive(Debug, Clone)]
pub struct ConnectionMachine {
    policy: ReconnectPolicy,
    phase: ConnectionPhase,
    attempts: u32,
    last_error: Option<String>,
    terminal: Option<TerminalReason>,
}

impl ConnectionMachine {
    pub fn new(policy: ReconnectPolicy) -> Self {
        Self {
            policy,
            phase: ConnectionPhase::Disconnected,
            attempts: 0,
            last_error: None,
            terminal: None,
        }
    }

    pub fn policy(&self) -> &ReconnectPolicy {
        &self.policy
    }

    pub fn phase(&self) -> ConnectionPhase {
        self.phase
    }

    pub fn is_connected(&self) -> bool {
        self.phase == ConnectionPhase::Connected
    }

    /// Consecutive failed reconnects since the last successful open.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn terminal(&self) -> Option<TerminalReason> {
        self.terminal
    }

    /// Request a connection.
    ///
    /// Ignored while a socket or reconnect timer already exists.
    pub fn connect(&mut self, has_api_key: bool) -> Vec<Action> {
        if self.phase.is_active() {
            return Vec::new();
        }

        if !has_api_key {
            self.terminal = Some(TerminalReason::MissingApiKey);
            self.last_error = Some(ChannelError::MissingApiKey.to_string());
            return Vec::new();
        }

        self.terminal = None;
        self.last_error = None;
        self.phase = ConnectionPhase::Connecting;
        vec![Action::OpenSocket]
    }

    /// The socket could not be created at all. Not retried.
    pub fn open_failed(&mut self, reason: &str) -> Vec<Action> {
        self.phase = ConnectionPhase::Disconnected;
        self.terminal = Some(TerminalReason::InvalidEndpoint);
        self.last_error = Some(format!("Failed to start WebSocket connection: {}", reason));
        Vec::new()
    }

    pub fn opened(&mut self) -> Vec<Action> {
        self.phase = ConnectionPhase::Connected;
        self.attempts = 0;
        self.last_error = None;
        self.terminal = None;
        vec![Action::CancelReconnect]
    }

    /// Socket error. The close that follows decides what happens next.
    pub fn errored(&mut self) -> Vec<Action> {
        self.last_error = Some("WebSocket connection error".to_string());
        Vec::new()
    }

    pub fn closed(&mut self, close: &CloseInfo) -> Vec<Action> {
        if !matches!(
            self.phase,
            ConnectionPhase::Connecting | ConnectionPhase::Connected
        ) {
            return Vec::new();
        }

        self.phase = ConnectionPhase::Disconnected;

        if close.is_rejection() {
            let reason = if close.reason.is_empty() {
                "authentication/server error"
            } else {
                close.reason.as_str()
            };
            self.terminal = Some(TerminalReason::Rejected { code: close.code });
            self.last_error = Some(format!("Disconnected: {}", reason));
            return Vec::new();
        }

        if close.was_clean {
            self.last_error = None;
            return Vec::new();
        }

        let max = self.policy.max_attempts;
        if self.attempts >= max {
            self.terminal = Some(TerminalReason::RetriesExhausted);
            self.last_error = Some(format!(
                "Connection lost. Maximum reconnect attempts reached ({}/{})",
                max, max
            ));
            return Vec::new();
        }

        self.attempts += 1;
        let delay = self.policy.delay_for_attempt(self.attempts);
        self.phase = ConnectionPhase::ReconnectPending;
        self.last_error = Some(format!(
            "Connection lost. Reconnecting in {}s (attempt {}/{})",
            delay.as_secs_f64(),
            self.attempts,
            max
        ));
        vec![Action::ScheduleReconnect {
            attempt: self.attempts,
            delay,
        }]
    }

    /// The armed reconnect timer fired.
    pub fn reconnect_due(&mut self) -> Vec<Action> {
        if self.phase != ConnectionPhase::ReconnectPending {
            return Vec::new();
        }
        self.phase = ConnectionPhase::Connecting;
        vec![Action::OpenSocket]
    }

    /// The driver could not arm the timer for a scheduled reconnect.
    /// Leaves the pending state so a later `connect()` is not ignored.
    pub fn reconnect_unavailable(&mut self, reason: &str) -> Vec<Action> {
        if self.phase != ConnectionPhase::ReconnectPending {
            return Vec::new();
        }
        self.phase = ConnectionPhase::Disconnected;
        self.terminal = Some(TerminalReason::ReconnectUnavailable);
        self.last_error = Some(format!("Connection lost. Cannot schedule reconnect: {}", reason));
        Vec::new()
    }

    /// Tear down whatever is active with clean-close semantics.
    ///
    /// Does not reset the attempt counter.
    pub fn disconnect(&mut self) -> Vec<Action> {
        let actions = match self.phase {
            ConnectionPhase::Disconnected => return Vec::new(),
            ConnectionPhase::ReconnectPending => vec![Action::CancelReconnect],
            ConnectionPhase::Connecting | ConnectionPhase::Connected => vec![
                Action::CancelReconnect,
                Action::CloseSocket {
                    code: fusion_protocols::close_code::NORMAL,
                    reason: USER_DISCONNECT_REASON,
                },
            ],
        };

        self.phase = ConnectionPhase::Disconnected;
        self.last_error = None;
        actions
    }

    pub fn send_failed(&mut self, error: impl Into<String>) {
        self.last_error = Some(error.into());
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
