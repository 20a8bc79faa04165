//! Contextual hint notifications.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Payload of a `fusion_hint` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HintPayload {
    pub text: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub action: Option<HintAction>,
    /// Server-assigned id, when the backend provides one.
    #[serde(default)]
    pub id: Option<String>,
}

/// Severity/category of a hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HintKind {
    Alert,
    Warning,
    Suggestion,
    #[default]
    Info,
    Success,
    Other,
}

impl HintKind {
    /// Parse the payload's `type`, case-insensitively; absent means `Info`.
    pub fn parse(value: Option<&str>) -> Self {
        let Some(value) = value else {
            return Self::Info;
        };
        match value.to_ascii_lowercase().as_str() {
            "alert" => Self::Alert,
            "warning" => Self::Warning,
            "suggestion" => Self::Suggestion,
            "info" => Self::Info,
            "success" => Self::Success,
            _ => Self::Other,
        }
    }
}

impl fmt::Display for HintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HintKind::Alert => write!(f, "alert"),
            HintKind::Warning => write!(f, "warning"),
            HintKind::Suggestion => write!(f, "suggestion"),
            HintKind::Info => write!(f, "info"),
            HintKind::Success => write!(f, "success"),
            HintKind::Other => write!(f, "other"),
        }
    }
}

/// Optional action attached to a hint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HintAction {
    /// In-app route to navigate to.
    #[serde(default)]
    pub target: Option<String>,
    /// Structured advisor intent.
    #[serde(default)]
    pub intent: Option<String>,
    #[serde(default)]
    pub parameters: Option<Value>,
    #[serde(default)]
    pub label: Option<String>,
}

/// What clicking a hint action should do.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedAction {
    Navigate(String),
    Command {
        intent: String,
        parameters: Value,
        label: Option<String>,
    },
    Invalid,
}

impl HintAction {
    /// Navigation wins over a command when both are present.
    pub fn resolve(&self) -> ResolvedAction {
        if let Some(target) = self.target.as_deref().filter(|t| !t.is_empty()) {
            return ResolvedAction::Navigate(target.to_string());
        }
        if let Some(intent) = self.intent.as_deref().filter(|i| !i.is_empty()) {
            return ResolvedAction::Command {
                intent: intent.to_string(),
                parameters: self.parameters.clone().unwrap_or(Value::Null),
                label: self.label.clone(),
            };
        }
        ResolvedAction::Invalid
    }

    /// Button label, with the dashboard's fallback.
    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or("Details")
    }
}
