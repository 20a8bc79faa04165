//! # Fusion Channel
//!
//! The live update channel: one WebSocket feed to the Fusion backend that
//! reconnects with exponential backoff and publishes every inbound event to
//! an observable store.
//!
//! ```rust,ignore
//! let channel = LiveChannel::websocket(&config.live);
//! let reader = channel.reader();
//! channel.start();
//!
//! let mut events = reader.subscribe();
//! while let Ok(event) = events.recv().await {
//!     println!("{} #{}", event.kind(), event.seq);
//! }
//! ```

mod channel;
mod state;
mod store;
mod transport;
mod ws;

pub use channel::LiveChannel;
pub use state::{
    Action, ConnectionMachine, ConnectionPhase, ReconnectPolicy, TerminalReason,
    USER_DISCONNECT_REASON,
};
pub use store::{ChannelReader, ChannelSnapshot, InboundEvent};
pub use transport::{
    OutboundFrame, SocketEvent, SocketEventSink, SocketEvents, SocketHandle, Transport,
};
pub use ws::WsTransport;
