//! WebSocket close information.

use serde::{Deserialize, Serialize};

/// Close codes the live channel cares about (RFC 6455 section 7.4.1).
pub mod close_code {
    /// Normal closure.
    pub const NORMAL: u16 = 1000;
    /// Endpoint going away (server shutdown, page navigation).
    pub const GOING_AWAY: u16 = 1001;
    /// Close frame without a status code.
    pub const NO_STATUS: u16 = 1005;
    /// No close frame was received; never sent on the wire.
    pub const ABNORMAL: u16 = 1006;
    /// Policy violation, used by the server for a bad API key.
    pub const POLICY_VIOLATION: u16 = 1008;
    /// Unexpected server condition.
    pub const INTERNAL_ERROR: u16 = 1011;
}

/// How a socket closed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloseInfo {
    pub code: u16,
    #[serde(default)]
    pub reason: String,
    pub was_clean: bool,
}

impl CloseInfo {
    pub fn new(code: u16, reason: impl Into<String>, was_clean: bool) -> Self {
        Self {
            code,
            reason: reason.into(),
            was_clean,
        }
    }

    /// A close handshake completed with the given code.
    pub fn clean(code: u16, reason: impl Into<String>) -> Self {
        Self::new(code, reason, true)
    }

    /// The connection dropped without a close handshake.
    pub fn abnormal(reason: impl Into<String>) -> Self {
        Self::new(close_code::ABNORMAL, reason, false)
    }

    /// Server rejected the session (bad credentials or server fault).
    pub fn is_rejection(&self) -> bool {
        matches!(
            self.code,
            close_code::POLICY_VIOLATION | close_code::INTERNAL_ERROR
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_abnormal_is_unclean() {
        let info = CloseInfo::abnormal("reset by peer");
        assert_eq!(info.code, 1006);
        assert!(!info.was_clean);
        assert!(!info.is_rejection());
    }

    #[test]
    fn test_rejection_codes() {
        assert!(CloseInfo::clean(1008, "bad key").is_rejection());
        assert!(CloseInfo::clean(1011, "").is_rejection());
        assert!(!CloseInfo::clean(1000, "bye").is_rejection());
        assert!(!CloseInfo::new(1008, "", false).was_clean);
    }
}
