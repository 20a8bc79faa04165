use super::*;
use crate::types::MessageStatus;
use serde_json::json;

fn envelope(kind: &str, payload: serde_json::Value) -> Envelope {
    Envelope::new(kind, payload)
}

#[test]
fn test_decode_new_message() {
    let env = envelope(
        kinds::NEW_WHATSAPP_MESSAGE,
        json!({
            "id": "wamid.1",
            "chat_id": "5511999",
            "sender_id": "5511999",
            "content": "Oi",
            "timestamp": "2024-05-01T10:00:00Z"
        }),
    );
    match FusionEvent::from_envelope(&env) {
        FusionEvent::NewMessage(msg) => {
            assert_eq!(msg.id, "wamid.1");
            assert_eq!(msg.content.as_deref(), Some("Oi"));
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_decode_status() {
    let env = envelope(
        kinds::WHATSAPP_MESSAGE_STATUS,
        json!({"id": "m1", "chat_id": "c1", "status": "delivered", "timestamp": "t"}),
    );
    let event = FusionEvent::from_envelope(&env);
    assert_eq!(event.chat_id(), Some("c1"));
    match event {
        FusionEvent::MessageStatus(update) => assert_eq!(update.status, MessageStatus::Delivered),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_decode_mode_update() {
    let env = envelope(
        kinds::WHATSAPP_CHAT_MODE_UPDATE,
        json!({"chat_id": "c1", "new_mode": "agent"}),
    );
    assert!(matches!(
        FusionEvent::from_envelope(&env),
        FusionEvent::ChatModeUpdate(ChatModeUpdate { ref new_mode, .. }) if new_mode == "agent"
    ));
}

#[test]
fn test_decode_hint_and_command() {
    let hint = envelope(kinds::FUSION_HINT, json!({"text": "Customer waiting", "type": "alert"}));
    assert!(matches!(FusionEvent::from_envelope(&hint), FusionEvent::Hint(_)));

    let cmd = envelope(
        kinds::AGENT_COMMAND_UPDATE,
        json!({"job_id": "j1", "status": "completed"}),
    );
    assert!(matches!(
        FusionEvent::from_envelope(&cmd),
        FusionEvent::CommandUpdate(_)
    ));
}

#[test]
fn test_unknown_kind() {
    let env = envelope("presence_update", json!({}));
    let event = FusionEvent::from_envelope(&env);
    assert_eq!(event.kind(), "presence_update");
    assert!(matches!(event, FusionEvent::Unknown { .. }));
    assert!(event.chat_id().is_none());
}

#[test]
fn test_invalid_payload_is_reported_not_dropped() {
    let env = envelope(kinds::NEW_WHATSAPP_MESSAGE, json!({"chat_id": "c1"}));
    match FusionEvent::from_envelope(&env) {
        FusionEvent::Invalid { kind, reason } => {
            assert_eq!(kind, kinds::NEW_WHATSAPP_MESSAGE);
            assert!(reason.contains("id"));
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_null_payload_for_known_kind_is_invalid() {
    let env = envelope(kinds::FUSION_HINT, serde_json::Value::Null);
    assert!(matches!(
        FusionEvent::from_envelope(&env),
        FusionEvent::Invalid { .. }
    ));
}
