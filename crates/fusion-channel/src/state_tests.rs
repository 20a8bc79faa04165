use super::*;

fn machine() -> ConnectionMachine {
    ConnectionMachine::new(ReconnectPolicy::default())
}

fn connected() -> ConnectionMachine {
    let mut m = machine();
    m.connect(true);
    m.opened();
    m
}

fn lost() -> CloseInfo {
    CloseInfo::abnormal("")
}

#[test]
fn test_delay_doubles_per_attempt() {
    let policy = ReconnectPolicy::default();
    assert_eq!(policy.delay_for_attempt(1), Duration::from_millis(5000));
    assert_eq!(policy.delay_for_attempt(2), Duration::from_millis(10000));
    assert_eq!(policy.delay_for_attempt(3), Duration::from_millis(20000));
    assert_eq!(policy.delay_for_attempt(5), Duration::from_millis(80000));
}

#[test]
fn test_delay_saturates() {
    let policy = ReconnectPolicy {
        max_attempts: 100,
        base_delay: Duration::from_secs(u64::MAX / 2),
    };
    assert_eq!(policy.delay_for_attempt(64), Duration::MAX);
}

#[test]
fn test_policy_from_config() {
    let config = LiveConfig {
        max_reconnect_attempts: 3,
        reconnect_base_delay_ms: 250,
        ..LiveConfig::default()
    };
    let policy = ReconnectPolicy::from_config(&config);
    assert_eq!(policy.max_attempts, 3);
    assert_eq!(policy.delay_for_attempt(2), Duration::from_millis(500));
}

#[test]
fn test_connect_without_key() {
    let mut m = machine();
    assert!(m.connect(false).is_empty());
    assert_eq!(m.phase(), ConnectionPhase::Disconnected);
    assert_eq!(m.terminal(), Some(TerminalReason::MissingApiKey));
    assert!(m.last_error().unwrap().contains("API key"));
}

#[test]
fn test_connect_opens_socket() {
    let mut m = machine();
    assert_eq!(m.connect(true), vec![Action::OpenSocket]);
    assert_eq!(m.phase(), ConnectionPhase::Connecting);
    assert!(!m.is_connected());
}

#[test]
fn test_connect_is_noop_while_active() {
    let mut m = machine();
    m.connect(true);
    assert!(m.connect(true).is_empty());

    m.opened();
    assert!(m.connect(true).is_empty());

    m.closed(&lost());
    assert_eq!(m.phase(), ConnectionPhase::ReconnectPending);
    assert!(m.connect(true).is_empty());
}

#[test]
fn test_open_resets_attempts_and_error() {
    let mut m = connected();
    m.closed(&lost());
    m.reconnect_due();
    m.closed(&lost());
    assert_eq!(m.attempts(), 2);

    m.reconnect_due();
    assert_eq!(m.opened(), vec![Action::CancelReconnect]);
    assert_eq!(m.attempts(), 0);
    assert!(m.last_error().is_none());
    assert!(m.is_connected());
}

#[test]
fn test_unclean_closes_schedule_backoff() {
    let mut m = connected();

    for attempt in 1..=5u32 {
        let actions = m.closed(&lost());
        let delay = Duration::from_millis(5000 * 2u64.pow(attempt - 1));
        assert_eq!(actions, vec![Action::ScheduleReconnect { attempt, delay }]);
        assert_eq!(m.attempts(), attempt);
        assert!(m.last_error().unwrap().contains(&format!("attempt {}/5", attempt)));

        assert_eq!(m.reconnect_due(), vec![Action::OpenSocket]);
    }
}

#[test]
fn test_reconnect_message_format() {
    let mut m = connected();
    m.closed(&lost());
    assert_eq!(
        m.last_error(),
        Some("Connection lost. Reconnecting in 5s (attempt 1/5)")
    );
}

#[test]
fn test_exhausted_budget_is_terminal() {
    let mut m = connected();
    for _ in 0..5 {
        m.closed(&lost());
        m.reconnect_due();
    }
    assert_eq!(m.attempts(), 5);

    assert!(m.closed(&lost()).is_empty());
    assert_eq!(m.phase(), ConnectionPhase::Disconnected);
    assert_eq!(m.terminal(), Some(TerminalReason::RetriesExhausted));
    assert!(m.last_error().unwrap().contains("Maximum reconnect attempts"));

    // Nothing fires later.
    assert!(m.reconnect_due().is_empty());
    assert!(m.last_error().unwrap().contains("Maximum reconnect attempts"));
}

#[test]
fn test_policy_violation_never_reconnects() {
    for prior_failures in 0..3 {
        let mut m = connected();
        for _ in 0..prior_failures {
            m.closed(&lost());
            m.reconnect_due();
        }

        let actions = m.closed(&CloseInfo::new(1008, "Invalid API key", false));
        assert!(actions.is_empty());
        assert_eq!(m.terminal(), Some(TerminalReason::Rejected { code: 1008 }));
        assert_eq!(m.last_error(), Some("Disconnected: Invalid API key"));
    }
}

#[test]
fn test_internal_error_without_reason() {
    let mut m = connected();
    m.closed(&CloseInfo::clean(1011, ""));
    assert_eq!(m.terminal(), Some(TerminalReason::Rejected { code: 1011 }));
    assert_eq!(m.last_error(), Some("Disconnected: authentication/server error"));
}

#[test]
fn test_clean_close_clears_error() {
    let mut m = connected();
    m.errored();
    assert!(m.last_error().is_some());

    assert!(m.closed(&CloseInfo::clean(1000, "bye")).is_empty());
    assert!(m.last_error().is_none());
    assert!(m.terminal().is_none());
    assert_eq!(m.phase(), ConnectionPhase::Disconnected);
}

#[test]
fn test_error_keeps_phase() {
    let mut m = connected();
    m.errored();
    assert!(m.is_connected());
    assert_eq!(m.last_error(), Some("WebSocket connection error"));
}

#[test]
fn test_open_failed_is_terminal() {
    let mut m = machine();
    m.connect(true);
    m.open_failed("relative URL without a base");
    assert_eq!(m.phase(), ConnectionPhase::Disconnected);
    assert_eq!(m.terminal(), Some(TerminalReason::InvalidEndpoint));
    assert!(m.last_error().unwrap().starts_with("Failed to start WebSocket connection"));
}

#[test]
fn test_disconnect_connected_closes_socket() {
    let mut m = connected();
    let actions = m.disconnect();
    assert_eq!(
        actions,
        vec![
            Action::CancelReconnect,
            Action::CloseSocket {
                code: 1000,
                reason: USER_DISCONNECT_REASON,
            },
        ]
    );
    assert_eq!(m.phase(), ConnectionPhase::Disconnected);
    assert!(m.disconnect().is_empty());
}

#[test]
fn test_disconnect_cancels_pending_reconnect() {
    let mut m = connected();
    m.closed(&lost());

    assert_eq!(m.disconnect(), vec![Action::CancelReconnect]);
    assert!(m.last_error().is_none());
    assert_eq!(m.attempts(), 1);

    // A timer that slipped through is ignored.
    assert!(m.reconnect_due().is_empty());
}

#[test]
fn test_disconnect_then_connect_single_socket() {
    let mut m = connected();
    m.disconnect();
    assert_eq!(m.connect(true), vec![Action::OpenSocket]);
    assert!(m.connect(true).is_empty());
}

#[test]
fn test_manual_connect_leaves_terminal() {
    let mut m = connected();
    m.closed(&CloseInfo::clean(1008, ""));
    assert!(m.terminal().is_some());

    assert_eq!(m.connect(true), vec![Action::OpenSocket]);
    assert!(m.terminal().is_none());
    assert!(m.last_error().is_none());
}

#[test]
fn test_close_ignored_when_inactive() {
    let mut m = machine();
    assert!(m.closed(&lost()).is_empty());
    assert_eq!(m.attempts(), 0);
}

#[test]
fn test_send_failed_sets_error() {
    let mut m = machine();
    m.send_failed("Not connected");
    assert_eq!(m.last_error(), Some("Not connected"));
    assert_eq!(m.phase(), ConnectionPhase::Disconnected);
}

#[test]
fn test_phase_serialization() {
    let json = serde_json::to_string(&ConnectionPhase::ReconnectPending).unwrap();
    assert_eq!(json, "\"reconnect_pending\"");
    assert_eq!(ConnectionPhase::Connected.to_string(), "connected");

    let json = serde_json::to_string(&TerminalReason::Rejected { code: 1008 }).unwrap();
    assert_eq!(json, r#"{"reason":"rejected","code":1008}"#);
}

#[test]
fn test_reconnect_unavailable() {
    let mut m = connected();
    m.closed(&lost());
    assert_eq!(m.phase(), ConnectionPhase::ReconnectPending);

    assert!(m.reconnect_unavailable("no async runtime").is_empty());
    assert_eq!(m.phase(), ConnectionPhase::Disconnected);
    assert_eq!(m.terminal(), Some(TerminalReason::ReconnectUnavailable));
    assert_eq!(m.attempts(), 1);
    assert!(m.last_error().unwrap().contains("no async runtime"));

    // Only meaningful while a reconnect is pending.
    let mut idle = machine();
    assert!(idle.reconnect_unavailable("x").is_empty());
    assert!(idle.terminal().is_none());

    assert_eq!(m.connect(true), vec![Action::OpenSocket]);
}
