//! Fan-out of live events to every view.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, trace, warn};

use fusion_channel::{ChannelReader, ChannelSnapshot, InboundEvent};
use fusion_protocols::FusionEvent;

use crate::chat_list::ChatListView;
use crate::command_history::CommandHistory;
use crate::connection::ConnectionIndicator;
use crate::hints::{DEFAULT_MAX_HINTS, HintsPanel};
use crate::message_view::MessageView;
use crate::reducer::EventReducer;

#[derive(Debug, Clone)]
pub struct DashboardConfig {
    pub max_hints: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            max_hints: DEFAULT_MAX_HINTS,
        }
    }
}

/// All dashboard views, fed from one channel subscription.
#[derive(Debug)]
pub struct Dashboard {
    chat_list: ChatListView,
    messages: MessageView,
    hints: HintsPanel,
    commands: CommandHistory,
    connection: ConnectionIndicator,
    last_seq: u64,
    needs_resync: bool,
}

impl Default for Dashboard {
    fn default() -> Self {
        Self::new(DashboardConfig::default())
    }
}

impl Dashboard {
    pub fn new(config: DashboardConfig) -> Self {
        Self {
            chat_list: ChatListView::new(),
            messages: MessageView::new(),
            hints: HintsPanel::new(config.max_hints),
            commands: CommandHistory::new(),
            connection: ConnectionIndicator::from_snapshot(&ChannelSnapshot::default()),
            last_seq: 0,
            needs_resync: false,
        }
    }

    pub fn chat_list(&self) -> &ChatListView {
        &self.chat_list
    }

    pub fn chat_list_mut(&mut self) -> &mut ChatListView {
        &mut self.chat_list
    }

    pub fn messages(&self) -> &MessageView {
        &self.messages
    }

    pub fn messages_mut(&mut self) -> &mut MessageView {
        &mut self.messages
    }

    pub fn hints(&self) -> &HintsPanel {
        &self.hints
    }

    pub fn hints_mut(&mut self) -> &mut HintsPanel {
        &mut self.hints
    }

    pub fn commands(&self) -> &CommandHistory {
        &self.commands
    }

    pub fn connection(&self) -> &ConnectionIndicator {
        &self.connection
    }

    /// Events were lost; views should reload from REST.
    pub fn needs_resync(&self) -> bool {
        self.needs_resync
    }

    pub fn mark_resynced(&mut self) {
        self.needs_resync = false;
    }

    /// Forget the last applied sequence number, for a new channel.
    pub fn rebind(&mut self) {
        self.last_seq = 0;
    }

    /// Open a chat in both the list and the message pane.
    pub fn select_chat(&mut self, chat_id: &str) {
        self.chat_list.select(chat_id);
        self.messages.open(chat_id);
    }

    /// Apply an event from the channel. Sequence numbers already applied
    /// are skipped.
    ///
    /// Sequence numbers are per channel. Call [`Dashboard::rebind`] before
    /// feeding events from another `LiveChannel`.
    pub fn apply(&mut self, event: &InboundEvent) -> bool {
        if event.seq <= self.last_seq {
            trace!(seq = event.seq, "Event already applied");
            return false;
        }
        self.last_seq = event.seq;

        let decoded = FusionEvent::from_envelope(&event.envelope);
        self.dispatch(&decoded)
    }

    /// Hand a decoded event to every view.
    pub fn dispatch(&mut self, event: &FusionEvent) -> bool {
        match event {
            FusionEvent::Invalid { kind, reason } => {
                warn!(kind = %kind, "Ignoring invalid live payload: {}", reason);
                return false;
            }
            FusionEvent::Unknown { kind } => {
                debug!(kind = %kind, "No view consumes this event type");
                return false;
            }
            _ => {}
        }

        let reducers: [&mut dyn EventReducer; 4] = [
            &mut self.chat_list,
            &mut self.messages,
            &mut self.hints,
            &mut self.commands,
        ];

        let mut changed = false;
        for reducer in reducers {
            if reducer.reduce(event) {
                trace!(view = reducer.name(), kind = event.kind(), "View updated");
                changed = true;
            }
        }
        changed
    }

    pub fn update_connection(&mut self, snapshot: &ChannelSnapshot) -> bool {
        let indicator = ConnectionIndicator::from_snapshot(snapshot);
        if indicator == self.connection {
            return false;
        }
        self.connection = indicator;
        true
    }

    /// Pump channel events and state into `dashboard` until the channel
    /// is dropped.
    pub async fn run(dashboard: Arc<Mutex<Dashboard>>, reader: ChannelReader) {
        let mut events = reader.subscribe();
        let mut state = reader.watch();
        {
            let mut dashboard = dashboard.lock();
            dashboard.rebind();
            dashboard.update_connection(&state.borrow_and_update());
        }

        loop {
            tokio::select! {
                biased;

                received = events.recv() => match received {
                    Ok(event) => {
                        dashboard.lock().apply(&event);
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Dashboard fell behind the live channel; resync needed");
                        dashboard.lock().needs_resync = true;
                    }
                    Err(RecvError::Closed) => break,
                },
                changed = state.changed() => match changed {
                    Ok(()) => {
                        let snapshot = state.borrow_and_update().clone();
                        dashboard.lock().update_connection(&snapshot);
                    }
                    Err(_) => break,
                },
            }
        }

        info!("Dashboard stopped: live channel closed");
    }
}

#[cfg(test)]
#[path = "dashboard_tests.rs"]
mod tests;
