//! Live update channel handle.

use std::collections::VecDeque;
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace, warn};
use url::Url;

use fusion_config::LiveConfig;
use fusion_protocols::{ChannelError, CloseInfo, Envelope};

use crate::state::{Action, ConnectionMachine, ReconnectPolicy, TerminalReason};
use crate::store::{ChannelReader, ChannelSnapshot, StoreWriter};
use crate::transport::{SocketEvent, SocketEventSink, SocketEvents, SocketHandle, Transport};
use crate::ws::WsTransport;

/// The live update channel.
///
/// Owns at most one socket and at most one reconnect timer. State is
/// published through [`ChannelReader`]; dropping the channel disconnects it.
pub struct LiveChannel {
    shared: Arc<Shared>,
}

impl LiveChannel {
    pub fn new(config: &LiveConfig, transport: Arc<dyn Transport>) -> Self {
        let policy = ReconnectPolicy::from_config(config);
        let shared = Arc::new_cyclic(|weak_self| Shared {
            weak_self: weak_self.clone(),
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone().filter(|key| !key.is_empty()),
            transport,
            store: StoreWriter::new(config.event_buffer),
            inner: Mutex::new(Inner {
                machine: ConnectionMachine::new(policy),
                socket: None,
                timer: None,
                next_socket_id: 1,
                next_timer_generation: 1,
            }),
        });
        Self { shared }
    }

    /// Channel over real WebSockets.
    pub fn websocket(config: &LiveConfig) -> Self {
        Self::new(config, Arc::new(WsTransport::new()))
    }

    /// Mount-time connect: connects when a key is configured and records
    /// the configuration error otherwise.
    pub fn start(&self) {
        if self.shared.api_key.is_none() {
            error!("Cannot connect live channel on start: API key missing");
        }
        self.connect();
    }

    /// Open the socket unless one (or a reconnect timer) already exists.
    pub fn connect(&self) {
        self.shared.connect();
    }

    /// Close the socket with 1000 and cancel any pending reconnect.
    pub fn disconnect(&self) {
        self.shared.disconnect();
    }

    /// Serialize and send a message. Returns `false` and records the error
    /// when the channel is not connected.
    pub fn send<T: Serialize + ?Sized>(&self, message: &T) -> bool {
        self.try_send(message).is_ok()
    }

    pub fn try_send<T: Serialize + ?Sized>(&self, message: &T) -> Result<(), ChannelError> {
        self.shared.send(message)
    }

    pub fn reader(&self) -> ChannelReader {
        self.shared.store.reader()
    }

    pub fn state(&self) -> ChannelSnapshot {
        self.shared.store.snapshot()
    }

    /// The endpoint without its query string, safe to log.
    pub fn endpoint(&self) -> String {
        match Url::parse(&self.shared.base_url) {
            Ok(url) => redact(&url),
            Err(_) => self.shared.base_url.clone(),
        }
    }

    pub fn reconnect_pending(&self) -> bool {
        self.shared.inner.lock().timer.is_some()
    }
}

impl Drop for LiveChannel {
    fn drop(&mut self) {
        self.shared.disconnect();
    }
}

struct Shared {
    weak_self: Weak<Shared>,
    base_url: String,
    api_key: Option<String>,
    transport: Arc<dyn Transport>,
    store: StoreWriter,
    inner: Mutex<Inner>,
}

struct Inner {
    machine: ConnectionMachine,
    socket: Option<SocketHandle>,
    timer: Option<ReconnectTimer>,
    next_socket_id: u64,
    next_timer_generation: u64,
}

struct ReconnectTimer {
    generation: u64,
    task: JoinHandle<()>,
}

impl Shared {
    fn connect(&self) {
        let mut inner = self.inner.lock();
        if inner.machine.phase().is_active() {
            debug!(phase = %inner.machine.phase(), "Live channel already active, ignoring connect");
            return;
        }

        let actions = inner.machine.connect(self.api_key.is_some());
        if inner.machine.terminal() == Some(TerminalReason::MissingApiKey) {
            error!("{}", ChannelError::MissingApiKey);
        }
        self.execute(&mut inner, actions);
        self.store.publish_state(&inner.machine);
    }

    fn disconnect(&self) {
        let mut inner = self.inner.lock();
        let actions = inner.machine.disconnect();
        if actions.is_empty() {
            debug!("Live channel already disconnected");
            return;
        }

        info!("Disconnecting live channel");
        self.execute(&mut inner, actions);
        self.store.publish_state(&inner.machine);
    }

    fn send<T: Serialize + ?Sized>(&self, message: &T) -> Result<(), ChannelError> {
        let mut inner = self.inner.lock();
        let result = match &inner.socket {
            Some(socket) if inner.machine.is_connected() => serde_json::to_string(message)
                .map_err(ChannelError::from)
                .and_then(|text| socket.send_text(text)),
            _ => Err(ChannelError::NotConnected),
        };

        match &result {
            Ok(()) => debug!("Live message sent"),
            Err(ChannelError::NotConnected) => {
                warn!("Cannot send live message: not connected");
                inner.machine.send_failed(ChannelError::NotConnected.to_string());
            }
            Err(e) => {
                error!("Failed to send live message: {}", e);
                inner
                    .machine
                    .send_failed(format!("Failed to send WebSocket message: {}", e));
            }
        }
        if result.is_err() {
            self.store.publish_state(&inner.machine);
        }
        result
    }

    fn execute(&self, inner: &mut Inner, actions: Vec<Action>) {
        let mut queue: VecDeque<Action> = actions.into();
        while let Some(action) = queue.pop_front() {
            match action {
                Action::OpenSocket => queue.extend(self.open_socket(inner)),
                Action::ScheduleReconnect { attempt, delay } => {
                    queue.extend(self.schedule_reconnect(inner, attempt, delay))
                }
                Action::CancelReconnect => {
                    if let Some(timer) = inner.timer.take() {
                        timer.task.abort();
                        debug!(generation = timer.generation, "Reconnect timer cancelled");
                    }
                }
                Action::CloseSocket { code, reason } => {
                    if let Some(socket) = inner.socket.take() {
                        debug!(socket_id = socket.id(), code, "Closing live socket");
                        socket.close(code, reason);
                    }
                }
            }
        }
    }

    fn open_socket(&self, inner: &mut Inner) -> Vec<Action> {
        let url = match self.endpoint_url() {
            Ok(url) => url,
            Err(e) => {
                error!("Failed to build live channel URL: {}", e);
                return inner.machine.open_failed(&e.to_string());
            }
        };

        let socket_id = inner.next_socket_id;
        inner.next_socket_id += 1;

        info!(
            socket_id,
            attempt = inner.machine.attempts(),
            "Connecting live channel to {}",
            redact(&url)
        );

        let sink: Weak<dyn SocketEventSink> = self.weak_self.clone();
        match self.transport.open(&url, SocketEvents::new(socket_id, sink)) {
            Ok(socket) => {
                inner.socket = Some(socket);
                Vec::new()
            }
            Err(e) => {
                error!(socket_id, "Failed to open live socket: {}", e);
                inner.machine.open_failed(&e.to_string())
            }
        }
    }

    fn schedule_reconnect(&self, inner: &mut Inner, attempt: u32, delay: Duration) -> Vec<Action> {
        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(e) => {
                error!(attempt, "Cannot schedule live channel reconnect: {}", e);
                return inner.machine.reconnect_unavailable("no async runtime");
            }
        };

        let generation = inner.next_timer_generation;
        inner.next_timer_generation += 1;

        info!(
            attempt,
            max_attempts = inner.machine.policy().max_attempts,
            delay_ms = delay.as_millis() as u64,
            "Scheduling live channel reconnect"
        );

        let weak = self.weak_self.clone();
        let task = runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(shared) = weak.upgrade() {
                shared.reconnect_fired(generation);
            }
        });

        if let Some(previous) = inner.timer.replace(ReconnectTimer { generation, task }) {
            previous.task.abort();
        }
        Vec::new()
    }

    fn reconnect_fired(&self, generation: u64) {
        let mut inner = self.inner.lock();
        match &inner.timer {
            Some(timer) if timer.generation == generation => {}
            _ => {
                debug!(generation, "Ignoring stale reconnect timer");
                return;
            }
        }

        // Free the slot first so the reconnect below is not mistaken for a
        // pending one.
        inner.timer = None;
        info!(attempt = inner.machine.attempts(), "Reconnecting live channel");
        let actions = inner.machine.reconnect_due();
        self.execute(&mut inner, actions);
        self.store.publish_state(&inner.machine);
    }

    fn handle_close(&self, inner: &mut Inner, socket_id: u64, close: &CloseInfo) -> Vec<Action> {
        inner.socket = None;

        if close.is_rejection() {
            error!(
                socket_id,
                code = close.code,
                "Live channel rejected by server: '{}'",
                close.reason
            );
        } else if close.was_clean {
            info!(socket_id, code = close.code, "Live channel closed");
        } else {
            warn!(
                socket_id,
                code = close.code,
                "Live channel connection lost: '{}'",
                close.reason
            );
        }

        let actions = inner.machine.closed(close);
        if inner.machine.terminal() == Some(TerminalReason::RetriesExhausted) {
            error!(
                attempts = inner.machine.attempts(),
                "Giving up on live channel: maximum reconnect attempts reached"
            );
        }
        actions
    }

    fn receive(&self, socket_id: u64, text: &str) {
        match Envelope::parse(text) {
            Ok(envelope) => {
                let event = self.store.publish_message(envelope);
                debug!(socket_id, seq = event.seq, kind = event.kind(), "Live message received");
            }
            Err(e) => warn!(socket_id, "Dropping malformed live message: {}", e),
        }
    }

    fn endpoint_url(&self) -> Result<Url, ChannelError> {
        let key = self.api_key.as_deref().ok_or(ChannelError::MissingApiKey)?;
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| ChannelError::InvalidEndpoint(format!("{}: {}", self.base_url, e)))?;
        url.query_pairs_mut().append_pair("apiKey", key);
        Ok(url)
    }
}

impl SocketEventSink for Shared {
    fn on_socket_event(&self, socket_id: u64, event: SocketEvent) {
        let mut inner = self.inner.lock();
        if inner.socket.as_ref().map(SocketHandle::id) != Some(socket_id) {
            trace!(socket_id, "Ignoring event from detached socket");
            return;
        }

        let actions = match event {
            SocketEvent::Opened => {
                info!(socket_id, "Live channel connected");
                inner.machine.opened()
            }
            SocketEvent::Message(text) => {
                self.receive(socket_id, &text);
                return;
            }
            SocketEvent::Error(reason) => {
                warn!(socket_id, "Live channel socket error: {}", reason);
                inner.machine.errored()
            }
            SocketEvent::Closed(close) => self.handle_close(&mut inner, socket_id, &close),
        };

        self.execute(&mut inner, actions);
        self.store.publish_state(&inner.machine);
    }
}

fn redact(url: &Url) -> String {
    let mut url = url.clone();
    url.set_query(None);
    url.to_string()
}

#[cfg(test)]
#[path = "channel_tests.rs"]
mod tests;
