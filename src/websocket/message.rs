//! Frames and the JSON message envelope.

use axum::body::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use crate::websocket::connection::WebSocketConnection;

/// A data frame as received from or sent to the peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Text(String),
    Binary(Bytes),
}

/// `{"MessageType": "...", "Data": ...}` envelope used by clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct WebSocketMessage {
    pub message_type: String,
    #[serde(default)]
    pub data: Value,
}

impl WebSocketMessage {
    pub fn new(message_type: impl Into<String>, data: Value) -> Self {
        Self {
            message_type: message_type.into(),
            data,
        }
    }

    /// Parse a text frame. Binary frames and non-envelope text yield `None`.
    pub fn parse(frame: &Frame) -> Option<Self> {
        match frame {
            Frame::Text(text) => serde_json::from_str(text).ok(),
            Frame::Binary(_) => None,
        }
    }

    pub fn to_frame(&self) -> Result<Frame, serde_json::Error> {
        serde_json::to_string(self).map(Frame::Text)
    }
}

/// One inbound frame as delivered to listeners.
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    pub connection: Arc<WebSocketConnection>,
    pub frame: Frame,
    /// The parsed envelope, when the frame carried one.
    pub envelope: Option<WebSocketMessage>,
}

impl IncomingMessage {
    pub fn new(connection: Arc<WebSocketConnection>, frame: Frame) -> Self {
        let envelope = WebSocketMessage::parse(&frame);
        Self {
            connection,
            frame,
            envelope,
        }
    }

    pub fn message_type(&self) -> Option<&str> {
        self.envelope.as_ref().map(|e| e.message_type.as_str())
    }
}
