//! WebSocket connection hub.
//!
//! # Data Flow
//! ```text
//! Upgrade admitted by the gateway
//!     → hub.rs accept (register, mark open, publish Connected)
//!     → frames from the peer → hub.rs on_message
//!         → message.rs (parse JSON envelope)
//!         → every listener concurrently
//!
//! Close (peer, error or hub stop):
//!     connection.rs close (once) → observers (hub deregistration)
//!     → transport release (once) → publish Disconnected
//! ```
//!
//! # Design Decisions
//! - Registry is a plain mutex, never held across `.await` or transport I/O
//! - Connections deregister themselves through close observers
//! - Listener failures are logged, never propagated to the peer

pub mod connection;
pub mod hub;
pub mod keepalive;
pub mod message;

use thiserror::Error;

pub use connection::{ConnectionState, Transport, WebSocketConnection};
pub use hub::{HubEvent, WebSocketHub, WebSocketListener};
pub use keepalive::KeepAliveListener;
pub use message::{Frame, IncomingMessage, WebSocketMessage};

/// Errors raised by connections and the hub.
#[derive(Debug, Error)]
pub enum WsError {
    /// The connection is not open.
    #[error("connection {0} is closed")]
    Closed(uuid::Uuid),

    /// The hub has been stopped and accepts no connections.
    #[error("WebSocket hub is stopped")]
    HubStopped,

    /// The transport refused the frame.
    #[error("failed to send message: {0}")]
    SendFailed(String),

    /// The transport could not be released cleanly.
    #[error("failed to release transport: {0}")]
    ReleaseFailed(String),

    #[error("failed to encode message: {0}")]
    Encode(#[from] serde_json::Error),
}
