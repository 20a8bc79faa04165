//! Observable channel state.
//!
//! One writer (the channel) and any number of readers. The snapshot is
//! last-value-wins through a `watch` channel; every inbound event is also
//! queued on a bounded `broadcast` channel so a burst arriving in one tick
//! reaches every subscriber.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::{broadcast, watch};

use fusion_protocols::Envelope;

use crate::state::{ConnectionMachine, ConnectionPhase, TerminalReason};

/// An inbound message with its arrival sequence number.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundEvent {
    /// Strictly increasing per channel, starting at 1.
    pub seq: u64,
    pub envelope: Arc<Envelope>,
}

impl InboundEvent {
    pub fn kind(&self) -> &str {
        &self.envelope.kind
    }
}

/// Read-only view of the channel.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChannelSnapshot {
    pub phase: ConnectionPhase,
    pub is_connected: bool,
    pub last_message: Option<InboundEvent>,
    pub last_error: Option<String>,
    pub reconnect_attempts: u32,
    pub terminal: Option<TerminalReason>,
}

pub(crate) struct StoreWriter {
    state: watch::Sender<ChannelSnapshot>,
    events: broadcast::Sender<InboundEvent>,
    next_seq: AtomicU64,
}

impl StoreWriter {
    pub(crate) fn new(buffer: usize) -> Self {
        let (state, _) = watch::channel(ChannelSnapshot::default());
        let (events, _) = broadcast::channel(buffer.max(1));
        Self {
            state,
            events,
            next_seq: AtomicU64::new(1),
        }
    }

    pub(crate) fn reader(&self) -> ChannelReader {
        ChannelReader {
            state: self.state.subscribe(),
            events: self.events.subscribe(),
        }
    }

    pub(crate) fn snapshot(&self) -> ChannelSnapshot {
        self.state.borrow().clone()
    }

    /// Copy the machine's state into the snapshot, notifying only on change.
    pub(crate) fn publish_state(&self, machine: &ConnectionMachine) {
        self.state.send_if_modified(|snapshot| {
            let last_error = machine.last_error().map(str::to_string);
            let changed = snapshot.phase != machine.phase()
                || snapshot.last_error != last_error
                || snapshot.reconnect_attempts != machine.attempts()
                || snapshot.terminal != machine.terminal();

            snapshot.phase = machine.phase();
            snapshot.is_connected = machine.is_connected();
            snapshot.last_error = last_error;
            snapshot.reconnect_attempts = machine.attempts();
            snapshot.terminal = machine.terminal();
            changed
        });
    }

    pub(crate) fn publish_message(&self, envelope: Envelope) -> InboundEvent {
        let event = InboundEvent {
            seq: self.next_seq.fetch_add(1, Ordering::SeqCst),
            envelope: Arc::new(envelope),
        };

        self.state
            .send_modify(|snapshot| snapshot.last_message = Some(event.clone()));
        // No subscribers is fine; the snapshot still carries the message.
        let _ = self.events.send(event.clone());
        event
    }
}

/// Read side of the channel store.
pub struct ChannelReader {
    state: watch::Receiver<ChannelSnapshot>,
    events: broadcast::Receiver<InboundEvent>,
}

impl Clone for ChannelReader {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
            events: self.events.resubscribe(),
        }
    }
}

impl ChannelReader {
    /// Current snapshot.
    pub fn state(&self) -> ChannelSnapshot {
        self.state.borrow().clone()
    }

    /// Change notifications for the snapshot.
    pub fn watch(&self) -> watch::Receiver<ChannelSnapshot> {
        self.state.clone()
    }

    /// Every event received from now on.
    ///
    /// The queue is bounded; a subscriber that falls behind gets
    /// `RecvError::Lagged` and should reload from REST.
    pub fn subscribe(&self) -> broadcast::Receiver<InboundEvent> {
        self.events.resubscribe()
    }
}
