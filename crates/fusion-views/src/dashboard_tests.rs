use std::time::Duration;

use serde_json::json;
use tokio::sync::mpsc;
use url::Url;

use super::*;
use fusion_channel::{LiveChannel, SocketEvent, SocketEvents, SocketHandle, Transport};
use fusion_config::LiveConfig;
use fusion_protocols::{ChannelError, Envelope};

fn inbound(seq: u64, kind: &str, payload: serde_json::Value) -> InboundEvent {
    InboundEvent {
        seq,
        envelope: Arc::new(Envelope::new(kind, payload)),
    }
}

fn new_message(seq: u64, id: &str, chat_id: &str) -> InboundEvent {
    inbound(
        seq,
        "new_whatsapp_message",
        json!({
            "id": id,
            "chat_id": chat_id,
            "sender_id": chat_id,
            "content": "Oi, tudo bem?",
            "timestamp": "2024-05-01T10:00:00Z"
        }),
    )
}

#[test]
fn test_event_reaches_every_view() {
    let mut dashboard = Dashboard::default();
    dashboard.select_chat("5511");

    assert!(dashboard.apply(&new_message(1, "m1", "5511")));
    assert_eq!(dashboard.messages().messages().len(), 1);
    let chat = dashboard.chat_list().get("5511").unwrap();
    assert_eq!(chat.unread_count, 0);
    assert_eq!(chat.last_message_preview.as_deref(), Some("Oi, tudo bem?"));
}

#[test]
fn test_same_seq_applied_once() {
    let mut dashboard = Dashboard::default();
    let event = new_message(1, "m1", "5511");

    assert!(dashboard.apply(&event));
    assert!(!dashboard.apply(&event));
    assert_eq!(dashboard.chat_list().get("5511").unwrap().unread_count, 1);
}

#[test]
fn test_redelivery_under_new_seq_is_idempotent() {
    let mut dashboard = Dashboard::default();
    dashboard.messages_mut().open("5511");

    dashboard.apply(&new_message(1, "m1", "5511"));
    assert!(!dashboard.apply(&new_message(2, "m1", "5511")));
    assert_eq!(dashboard.messages().messages().len(), 1);
    assert_eq!(dashboard.chat_list().get("5511").unwrap().unread_count, 1);
}

#[test]
fn test_id_less_hint_redelivery_shown_once() {
    let mut dashboard = Dashboard::default();
    let payload = json!({"text": "Cliente pediu desconto", "type": "suggestion"});

    assert!(dashboard.apply(&inbound(1, "fusion_hint", payload.clone())));
    assert!(!dashboard.apply(&inbound(2, "fusion_hint", payload)));
    assert_eq!(dashboard.hints().hints().len(), 1);
}

#[test]
fn test_rebind_accepts_restarted_sequence() {
    let mut dashboard = Dashboard::default();
    dashboard.apply(&new_message(5, "m1", "5511"));

    dashboard.rebind();
    assert!(dashboard.apply(&new_message(1, "m2", "5511")));
    assert_eq!(dashboard.chat_list().get("5511").unwrap().unread_count, 2);
}

#[test]
fn test_hint_and_command_routed() {
    let mut dashboard = Dashboard::new(DashboardConfig { max_hints: 2 });

    dashboard.apply(&inbound(1, "fusion_hint", json!({"text": "a"})));
    dashboard.apply(&inbound(2, "fusion_hint", json!({"text": "b"})));
    dashboard.apply(&inbound(3, "fusion_hint", json!({"text": "c"})));
    assert_eq!(dashboard.hints().hints().len(), 2);

    dashboard.apply(&inbound(
        4,
        "agent_command_update",
        json!({"job_id": "j1", "status": "executing_step", "message": "step"}),
    ));
    assert_eq!(dashboard.commands().active_job(), Some("j1"));
}

#[test]
fn test_invalid_and_unknown_ignored() {
    let mut dashboard = Dashboard::default();
    assert!(!dashboard.apply(&inbound(1, "fusion_hint", json!({"no_text": true}))));
    assert!(!dashboard.apply(&inbound(2, "pong", json!(null))));
    assert!(dashboard.hints().hints().is_empty());
}

#[test]
fn test_update_connection() {
    let mut dashboard = Dashboard::default();
    assert!(!dashboard.update_connection(&ChannelSnapshot::default()));

    let snapshot = ChannelSnapshot {
        phase: fusion_channel::ConnectionPhase::Connected,
        is_connected: true,
        ..ChannelSnapshot::default()
    };
    assert!(dashboard.update_connection(&snapshot));
    assert!(dashboard.connection().connected);
}

#[derive(Default)]
struct StubTransport {
    sockets: Mutex<Vec<(SocketEvents, mpsc::UnboundedReceiver<fusion_channel::OutboundFrame>)>>,
}

impl StubTransport {
    fn emit(&self, event: SocketEvent) {
        let events = self.sockets.lock()[0].0.clone();
        events.emit(event);
    }
}

impl Transport for StubTransport {
    fn open(&self, _url: &Url, events: SocketEvents) -> Result<SocketHandle, ChannelError> {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = SocketHandle::new(events.socket_id(), tx);
        self.sockets.lock().push((events, rx));
        Ok(handle)
    }
}

fn live_config(event_buffer: usize) -> LiveConfig {
    LiveConfig {
        api_key: Some("k1".to_string()),
        event_buffer,
        ..LiveConfig::default()
    }
}

async fn settle() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}

fn message_text(id: &str) -> String {
    json!({
        "type": "new_whatsapp_message",
        "payload": {"id": id, "chat_id": "5511", "sender_id": "5511", "content": id}
    })
    .to_string()
}

#[tokio::test]
async fn test_run_follows_channel() {
    let transport = Arc::new(StubTransport::default());
    let channel = LiveChannel::new(&live_config(16), transport.clone());
    let dashboard = Arc::new(Mutex::new(Dashboard::default()));

    let task = tokio::spawn(Dashboard::run(dashboard.clone(), channel.reader()));
    settle().await;

    channel.connect();
    transport.emit(SocketEvent::Opened);
    transport.emit(SocketEvent::Message(message_text("m1")));
    transport.emit(SocketEvent::Message(message_text("m2")));
    settle().await;

    {
        let dashboard = dashboard.lock();
        assert!(dashboard.connection().connected);
        assert_eq!(dashboard.chat_list().get("5511").unwrap().unread_count, 2);
        assert!(!dashboard.needs_resync());
    }

    drop(channel);
    tokio::time::timeout(Duration::from_secs(1), task)
        .await
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn test_run_flags_resync_on_lag() {
    let transport = Arc::new(StubTransport::default());
    let channel = LiveChannel::new(&live_config(1), transport.clone());
    let dashboard = Arc::new(Mutex::new(Dashboard::default()));

    let _task = tokio::spawn(Dashboard::run(dashboard.clone(), channel.reader()));
    settle().await;

    channel.connect();
    transport.emit(SocketEvent::Opened);
    for id in ["m1", "m2", "m3"] {
        transport.emit(SocketEvent::Message(message_text(id)));
    }
    settle().await;

    let mut dashboard = dashboard.lock();
    assert!(dashboard.needs_resync());
    // The newest event still got through.
    assert_eq!(
        dashboard.chat_list().get("5511").unwrap().last_message_preview.as_deref(),
        Some("m3")
    );
    dashboard.mark_resynced();
    assert!(!dashboard.needs_resync());
}
