//! Socket transport abstraction.

use std::fmt;
use std::sync::Weak;

use tokio::sync::mpsc;
use tracing::trace;
use url::Url;

use fusion_protocols::{ChannelError, CloseInfo};

/// Lifecycle of one socket, as reported by a transport.
#[derive(Debug, Clone, PartialEq)]
pub enum SocketEvent {
    Opened,
    Message(String),
    Error(String),
    /// Always the last event of a socket.
    Closed(CloseInfo),
}

/// Receiver of socket events.
pub trait SocketEventSink: Send + Sync {
    fn on_socket_event(&self, socket_id: u64, event: SocketEvent);
}

/// Event reporter handed to a transport for one socket.
///
/// Holds the sink weakly: once the channel is gone, events are dropped.
#[derive(Clone)]
pub struct SocketEvents {
    socket_id: u64,
    sink: Weak<dyn SocketEventSink>,
}

impl SocketEvents {
    pub fn new(socket_id: u64, sink: Weak<dyn SocketEventSink>) -> Self {
        Self { socket_id, sink }
    }

    pub fn socket_id(&self) -> u64 {
        self.socket_id
    }

    pub fn emit(&self, event: SocketEvent) {
        match self.sink.upgrade() {
            Some(sink) => sink.on_socket_event(self.socket_id, event),
            None => trace!(socket_id = self.socket_id, "Socket event sink dropped"),
        }
    }
}

impl fmt::Debug for SocketEvents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SocketEvents")
            .field("socket_id", &self.socket_id)
            .finish_non_exhaustive()
    }
}

/// Frame queued for the socket task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundFrame {
    Text(String),
    Close { code: u16, reason: String },
}

/// Write side of an open socket.
///
/// Dropping the handle lets the socket task close the connection.
#[derive(Debug)]
pub struct SocketHandle {
    id: u64,
    outbound: mpsc::UnboundedSender<OutboundFrame>,
}

impl SocketHandle {
    pub fn new(id: u64, outbound: mpsc::UnboundedSender<OutboundFrame>) -> Self {
        Self { id, outbound }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn send_text(&self, text: String) -> Result<(), ChannelError> {
        self.outbound
            .send(OutboundFrame::Text(text))
            .map_err(|_| ChannelError::SendFailed("socket task has stopped".to_string()))
    }

    pub fn close(&self, code: u16, reason: &str) {
        let _ = self.outbound.send(OutboundFrame::Close {
            code,
            reason: reason.to_string(),
        });
    }
}

/// Opens sockets for the live channel.
///
/// `open` starts the connection and returns at once. Lifecycle events must
/// be reported through `events` after `open` has returned, never from
/// inside it.
pub trait Transport: Send + Sync {
    fn open(&self, url: &Url, events: SocketEvents) -> Result<SocketHandle, ChannelError>;
}
