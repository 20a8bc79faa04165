//! Right-hand hints panel.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use fusion_protocols::{
    FusionEvent, GatewayRequest, HintAction, HintKind, HintPayload, ResolvedAction,
};

use crate::recent::RecentSet;
use crate::reducer::EventReducer;

/// Default number of hints kept on screen.
pub const DEFAULT_MAX_HINTS: usize = 10;

/// Content keys remembered for hints the server sent without an id.
const SEEN_HINTS: usize = 256;

/// A hint as displayed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Hint {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub kind: HintKind,
    pub text: String,
    pub action: Option<HintAction>,
}

impl Hint {
    fn from_payload(payload: &HintPayload) -> Self {
        Self {
            id: payload
                .id
                .clone()
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
            timestamp: Utc::now(),
            kind: HintKind::parse(payload.kind.as_deref()),
            text: payload.text.clone(),
            action: payload.action.clone(),
        }
    }
}

/// Newest-first list of hints, capped at `max_hints`.
#[derive(Debug)]
pub struct HintsPanel {
    hints: Vec<Hint>,
    max_hints: usize,
    seen: RecentSet<String>,
}

impl Default for HintsPanel {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_HINTS)
    }
}

impl HintsPanel {
    pub fn new(max_hints: usize) -> Self {
        Self {
            hints: Vec::new(),
            max_hints: max_hints.max(1),
            seen: RecentSet::new(SEEN_HINTS),
        }
    }

    pub fn hints(&self) -> &[Hint] {
        &self.hints
    }

    pub fn get(&self, hint_id: &str) -> Option<&Hint> {
        self.hints.iter().find(|h| h.id == hint_id)
    }

    pub fn dismiss(&mut self, hint_id: &str) -> bool {
        let before = self.hints.len();
        self.hints.retain(|h| h.id != hint_id);
        let removed = self.hints.len() != before;
        if removed {
            debug!(hint_id, "Hint dismissed");
        }
        removed
    }

    /// What clicking the hint's action should do, if it has one.
    pub fn action(&self, hint_id: &str) -> Option<ResolvedAction> {
        self.get(hint_id)?.action.as_ref().map(HintAction::resolve)
    }

    /// Gateway request for a hint whose action is a structured command.
    pub fn command_request(
        &self,
        hint_id: &str,
        conversation_id: Option<String>,
    ) -> Option<GatewayRequest> {
        match self.action(hint_id)? {
            ResolvedAction::Command {
                intent, parameters, ..
            } => Some(GatewayRequest::structured(conversation_id, intent, parameters)),
            _ => None,
        }
    }

    fn push(&mut self, payload: &HintPayload) -> bool {
        let duplicate = match payload.id.as_deref() {
            Some(id) => self.hints.iter().any(|h| h.id == id),
            None => !self.seen.insert(content_key(payload)),
        };
        if duplicate {
            debug!("Duplicate hint ignored");
            return false;
        }

        let hint = Hint::from_payload(payload);
        info!(hint_id = %hint.id, kind = %hint.kind, "New hint: {}", hint.text);
        self.hints.insert(0, hint);
        self.hints.truncate(self.max_hints);
        true
    }
}

/// Identity of an id-less hint: its kind, text and action.
fn content_key(payload: &HintPayload) -> String {
    let action = payload
        .action
        .as_ref()
        .and_then(|action| serde_json::to_string(action).ok())
        .unwrap_or_default();
    format!(
        "{}\u{1f}{}\u{1f}{}",
        HintKind::parse(payload.kind.as_deref()),
        payload.text,
        action
    )
}

impl EventReducer for HintsPanel {
    fn name(&self) -> &'static str {
        "hints"
    }

    fn reduce(&mut self, event: &FusionEvent) -> bool {
        match event {
            FusionEvent::Hint(payload) => self.push(payload),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fusion_protocols::RequestType;
    use serde_json::json;

    fn hint(text: &str) -> FusionEvent {
        FusionEvent::Hint(HintPayload {
            text: text.to_string(),
            kind: None,
            action: None,
            id: None,
        })
    }

    fn hint_with(payload: serde_json::Value) -> FusionEvent {
        FusionEvent::Hint(serde_json::from_value(payload).unwrap())
    }

    #[test]
    fn test_newest_first_and_capped() {
        let mut panel = HintsPanel::default();
        for i in 0..12 {
            assert!(panel.reduce(&hint(&format!("hint {}", i))));
        }

        assert_eq!(panel.hints().len(), 10);
        assert_eq!(panel.hints()[0].text, "hint 11");
        assert_eq!(panel.hints()[9].text, "hint 2");
    }

    #[test]
    fn test_defaults() {
        let mut panel = HintsPanel::default();
        panel.reduce(&hint("check stock"));

        let shown = &panel.hints()[0];
        assert_eq!(shown.kind, HintKind::Info);
        assert!(shown.action.is_none());
        assert!(Uuid::parse_str(&shown.id).is_ok());
    }

    #[test]
    fn test_kind_parsed() {
        let mut panel = HintsPanel::default();
        panel.reduce(&hint_with(json!({"text": "low stock", "type": "Warning"})));
        assert_eq!(panel.hints()[0].kind, HintKind::Warning);
    }

    #[test]
    fn test_server_id_deduplicates() {
        let mut panel = HintsPanel::default();
        let event = hint_with(json!({"text": "once", "id": "h-1"}));
        assert!(panel.reduce(&event));
        assert!(!panel.reduce(&event));
        assert_eq!(panel.hints().len(), 1);
        assert_eq!(panel.hints()[0].id, "h-1");
    }

    #[test]
    fn test_id_less_repeat_ignored() {
        let mut panel = HintsPanel::default();
        assert!(panel.reduce(&hint("restock A1")));
        assert!(!panel.reduce(&hint("restock A1")));
        assert_eq!(panel.hints().len(), 1);

        // Same text with another kind or action is a different hint.
        assert!(panel.reduce(&hint_with(json!({"text": "restock A1", "type": "alert"}))));
        assert!(panel.reduce(&hint_with(json!({
            "text": "restock A1",
            "action": {"intent": "reorder_product"}
        }))));
        assert_eq!(panel.hints().len(), 3);
    }

    #[test]
    fn test_dismiss() {
        let mut panel = HintsPanel::default();
        panel.reduce(&hint("a"));
        panel.reduce(&hint("b"));
        let id = panel.hints()[1].id.clone();

        assert!(panel.dismiss(&id));
        assert!(!panel.dismiss(&id));
        assert_eq!(panel.hints().len(), 1);
        assert_eq!(panel.hints()[0].text, "b");
    }

    #[test]
    fn test_navigate_action() {
        let mut panel = HintsPanel::default();
        panel.reduce(&hint_with(json!({
            "text": "open orders",
            "id": "h-nav",
            "action": {"target": "/orders", "intent": "ignored"}
        })));

        assert_eq!(
            panel.action("h-nav"),
            Some(ResolvedAction::Navigate("/orders".to_string()))
        );
        assert!(panel.command_request("h-nav", None).is_none());
    }

    #[test]
    fn test_command_action_builds_request() {
        let mut panel = HintsPanel::default();
        panel.reduce(&hint_with(json!({
            "text": "reorder?",
            "id": "h-cmd",
            "action": {"intent": "reorder_product", "parameters": {"sku": "A1"}, "label": "Reorder"}
        })));

        let request = panel.command_request("h-cmd", Some("conv-1".to_string())).unwrap();
        assert_eq!(request.request_type, RequestType::Structured);
        assert_eq!(request.conversation_id.as_deref(), Some("conv-1"));
        assert_eq!(request.payload["intent"], "reorder_product");
        assert_eq!(request.payload["parameters"]["sku"], "A1");
    }

    #[test]
    fn test_invalid_action_and_missing_hint() {
        let mut panel = HintsPanel::default();
        panel.reduce(&hint_with(json!({"text": "x", "id": "h", "action": {}})));
        assert_eq!(panel.action("h"), Some(ResolvedAction::Invalid));
        assert!(panel.action("nope").is_none());
    }

    #[test]
    fn test_ignores_invalid_payload() {
        let mut panel = HintsPanel::default();
        assert!(!panel.reduce(&FusionEvent::Invalid {
            kind: "fusion_hint".to_string(),
            reason: "missing field `text`".to_string(),
        }));
        assert!(panel.hints().is_empty());
    }
}
