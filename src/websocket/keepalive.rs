//! Answers client keep-alive pings.

use async_trait::async_trait;
use serde_json::Value;

use crate::dispatch::error::BoxError;
use crate::websocket::hub::WebSocketListener;
use crate::websocket::message::{IncomingMessage, WebSocketMessage};

pub const KEEP_ALIVE: &str = "KeepAlive";

/// Echoes a `KeepAlive` envelope back to the sender.
#[derive(Debug, Default)]
pub struct KeepAliveListener;

#[async_trait]
impl WebSocketListener for KeepAliveListener {
    async fn on_message(&self, message: &IncomingMessage) -> Result<(), BoxError> {
        if message.message_type() != Some(KEEP_ALIVE) {
            return Ok(());
        }
        message
            .connection
            .send_message(&WebSocketMessage::new(KEEP_ALIVE, Value::Null))?;
        Ok(())
    }
}
