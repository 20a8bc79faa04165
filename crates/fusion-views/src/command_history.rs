//! Advisor command progress, fed by `agent_command_update`.

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use fusion_protocols::{CommandUpdate, FusionEvent};

use crate::reducer::EventReducer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandItemKind {
    IntermediateStep,
    Result,
}

/// One line in the advisor's command history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandItem {
    pub kind: CommandItemKind,
    pub role: String,
    pub job_id: String,
    pub text: Option<String>,
    pub details: Option<Value>,
    pub status: String,
}

impl CommandItem {
    fn from_update(kind: CommandItemKind, update: &CommandUpdate) -> Self {
        Self {
            kind,
            role: "system".to_string(),
            job_id: update.job_id.clone(),
            text: update.message.clone(),
            details: update.details.clone(),
            status: update.status.clone(),
        }
    }
}

/// Step log of advisor jobs plus the job currently running.
#[derive(Debug, Default)]
pub struct CommandHistory {
    items: Vec<CommandItem>,
    active_job: Option<String>,
}

impl CommandHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[CommandItem] {
        &self.items
    }

    pub fn active_job(&self) -> Option<&str> {
        self.active_job.as_deref()
    }

    pub fn items_for<'a>(&'a self, job_id: &'a str) -> impl Iterator<Item = &'a CommandItem> + 'a {
        self.items.iter().filter(move |item| item.job_id == job_id)
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.active_job = None;
    }

    fn apply(&mut self, update: &CommandUpdate) -> bool {
        if update.job_id.is_empty() || update.status.is_empty() {
            return false;
        }

        if update.is_intermediate() {
            self.record_step(update)
        } else {
            self.finish(update)
        }
    }

    fn record_step(&mut self, update: &CommandUpdate) -> bool {
        let step = CommandItem::from_update(CommandItemKind::IntermediateStep, update);
        let seen = self.items.contains(&step);
        if !seen {
            debug!(job_id = %update.job_id, "Advisor job step");
            self.items.push(step);
        }

        let was_active = self.active_job.as_deref() == Some(update.job_id.as_str());
        self.active_job = Some(update.job_id.clone());
        !seen || !was_active
    }

    fn finish(&mut self, update: &CommandUpdate) -> bool {
        let mut changed = false;

        match self.items.iter_mut().rev().find(|item| item.job_id == update.job_id) {
            Some(item) => {
                let patched = CommandItem::from_update(CommandItemKind::Result, update);
                if *item != patched {
                    *item = patched;
                    changed = true;
                }
            }
            None => {
                self.items
                    .push(CommandItem::from_update(CommandItemKind::Result, update));
                changed = true;
            }
        }

        if self.active_job.as_deref() == Some(update.job_id.as_str()) {
            debug!(job_id = %update.job_id, status = %update.status, "Advisor job finished");
            self.active_job = None;
            changed = true;
        }
        changed
    }
}

impl EventReducer for CommandHistory {
    fn name(&self) -> &'static str {
        "command_history"
    }

    fn reduce(&mut self, event: &FusionEvent) -> bool {
        match event {
            FusionEvent::CommandUpdate(update) => self.apply(update),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn update(job_id: &str, status: &str, message: &str) -> FusionEvent {
        FusionEvent::CommandUpdate(CommandUpdate {
            job_id: job_id.to_string(),
            status: status.to_string(),
            message: Some(message.to_string()),
            details: None,
        })
    }

    #[test]
    fn test_step_sets_active_job() {
        let mut history = CommandHistory::new();
        assert!(history.reduce(&update("j1", "executing_step", "Fetching stock")));

        assert_eq!(history.active_job(), Some("j1"));
        let item = &history.items()[0];
        assert_eq!(item.kind, CommandItemKind::IntermediateStep);
        assert_eq!(item.role, "system");
        assert_eq!(item.text.as_deref(), Some("Fetching stock"));
    }

    #[test]
    fn test_duplicate_step_skipped() {
        let mut history = CommandHistory::new();
        let step = update("j1", "executing_step", "Fetching stock");
        history.reduce(&step);
        assert!(!history.reduce(&step));
        assert_eq!(history.items().len(), 1);
    }

    #[test]
    fn test_final_status_updates_item_and_clears_active() {
        let mut history = CommandHistory::new();
        history.reduce(&update("j1", "executing_step", "Step 1"));
        history.reduce(&update("j1", "executing_step", "Step 2"));

        let done = FusionEvent::CommandUpdate(CommandUpdate {
            job_id: "j1".to_string(),
            status: "completed".to_string(),
            message: Some("Done".to_string()),
            details: Some(json!({"rows": 3})),
        });
        assert!(history.reduce(&done));
        assert!(history.active_job().is_none());

        let items: Vec<&CommandItem> = history.items_for("j1").collect();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].text.as_deref(), Some("Step 1"));
        assert_eq!(items[1].kind, CommandItemKind::Result);
        assert_eq!(items[1].status, "completed");
        assert_eq!(items[1].details, Some(json!({"rows": 3})));

        assert!(!history.reduce(&done));
    }

    #[test]
    fn test_final_for_other_job_keeps_active() {
        let mut history = CommandHistory::new();
        history.reduce(&update("j1", "executing_step", "Working"));
        history.reduce(&update("j2", "failed", "Boom"));

        assert_eq!(history.active_job(), Some("j1"));
        assert_eq!(history.items().len(), 2);
    }

    #[test]
    fn test_ignores_incomplete_update() {
        let mut history = CommandHistory::new();
        assert!(!history.reduce(&update("", "executing_step", "x")));
        assert!(!history.reduce(&update("j1", "", "x")));
        assert!(history.items().is_empty());
    }
}
