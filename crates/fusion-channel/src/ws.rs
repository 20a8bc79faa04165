//! WebSocket transport on tokio-tungstenite.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tracing::{debug, trace, warn};
use url::Url;

use fusion_protocols::{ChannelError, CloseInfo, close_code};

use crate::transport::{OutboundFrame, SocketEvent, SocketEvents, SocketHandle, Transport};

/// Production transport: one tokio task per socket.
#[derive(Debug, Clone)]
pub struct WsTransport {
    handshake_timeout: Duration,
}

impl Default for WsTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl WsTransport {
    pub fn new() -> Self {
        Self {
            handshake_timeout: Duration::from_secs(10),
        }
    }

    pub fn with_handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }
}

impl Transport for WsTransport {
    fn open(&self, url: &Url, events: SocketEvents) -> Result<SocketHandle, ChannelError> {
        match url.scheme() {
            "ws" | "wss" => {}
            other => {
                return Err(ChannelError::InvalidEndpoint(format!(
                    "unsupported scheme '{}'",
                    other
                )));
            }
        }
        if url.host_str().is_none() {
            return Err(ChannelError::InvalidEndpoint("missing host".to_string()));
        }

        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| ChannelError::WebSocket(format!("no async runtime: {}", e)))?;

        let (tx, rx) = mpsc::unbounded_channel();
        let handle = SocketHandle::new(events.socket_id(), tx);
        runtime.spawn(run_socket(
            url.clone(),
            self.handshake_timeout,
            events,
            rx,
        ));
        Ok(handle)
    }
}

async fn run_socket(
    url: Url,
    handshake_timeout: Duration,
    events: SocketEvents,
    mut outbound: mpsc::UnboundedReceiver<OutboundFrame>,
) {
    let socket_id = events.socket_id();

    let connect = tokio::time::timeout(
        handshake_timeout,
        tokio_tungstenite::connect_async(url.as_str()),
    )
    .await;
    let stream = match connect {
        Ok(Ok((stream, _response))) => stream,
        Ok(Err(e)) => {
            warn!(socket_id, "WebSocket handshake failed: {}", e);
            events.emit(SocketEvent::Error(e.to_string()));
            events.emit(SocketEvent::Closed(CloseInfo::abnormal(e.to_string())));
            return;
        }
        Err(_) => {
            warn!(socket_id, "WebSocket handshake timed out");
            events.emit(SocketEvent::Error("handshake timed out".to_string()));
            events.emit(SocketEvent::Closed(CloseInfo::abnormal("handshake timed out")));
            return;
        }
    };

    debug!(socket_id, "WebSocket open");
    events.emit(SocketEvent::Opened);

    let (mut sink, mut source) = stream.split();
    let mut outbound_open = true;
    let mut close_sent = false;

    let close = loop {
        tokio::select! {
            frame = outbound.recv(), if outbound_open => match frame {
                Some(OutboundFrame::Text(text)) => {
                    trace!(socket_id, "WebSocket send: {}", text);
                    if let Err(e) = sink.send(Message::Text(text.into())).await {
                        events.emit(SocketEvent::Error(e.to_string()));
                        break CloseInfo::abnormal(e.to_string());
                    }
                }
                Some(OutboundFrame::Close { code, reason }) => {
                    close_sent = true;
                    let frame = CloseFrame {
                        code: CloseCode::from(code),
                        reason: reason.into(),
                    };
                    if let Err(e) = sink.send(Message::Close(Some(frame))).await {
                        debug!(socket_id, "Failed to send close frame: {}", e);
                        break CloseInfo::clean(code, "");
                    }
                }
                None => {
                    // Handle dropped without an explicit close.
                    outbound_open = false;
                    if !close_sent {
                        let frame = CloseFrame {
                            code: CloseCode::Normal,
                            reason: String::new().into(),
                        };
                        if sink.send(Message::Close(Some(frame))).await.is_err() {
                            break CloseInfo::clean(close_code::NORMAL, "");
                        }
                    }
                }
            },
            message = source.next() => match message {
                Some(Ok(Message::Text(text))) => {
                    trace!(socket_id, "WebSocket recv: {}", text.as_str());
                    events.emit(SocketEvent::Message(text.as_str().to_owned()));
                }
                Some(Ok(Message::Binary(data))) => match String::from_utf8(data.to_vec()) {
                    Ok(text) => events.emit(SocketEvent::Message(text)),
                    Err(_) => warn!(socket_id, "Dropping non UTF-8 binary frame"),
                },
                Some(Ok(Message::Close(frame))) => {
                    let close = match frame {
                        Some(frame) => CloseInfo::clean(u16::from(frame.code), frame.reason.as_str()),
                        None => CloseInfo::clean(close_code::NO_STATUS, ""),
                    };
                    // The close reply is queued on receipt; flush it out.
                    if let Err(e) = sink.flush().await {
                        debug!(socket_id, "Failed to flush close reply: {}", e);
                    }
                    break close;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!(socket_id, "WebSocket error: {}", e);
                    events.emit(SocketEvent::Error(e.to_string()));
                    break CloseInfo::abnormal(e.to_string());
                }
                None => break CloseInfo::abnormal("connection closed without a close frame"),
            },
        }
    };

    debug!(
        socket_id,
        code = close.code,
        clean = close.was_clean,
        "WebSocket closed"
    );
    events.emit(SocketEvent::Closed(close));
}
