//! Shutdown coordination.

use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::dispatch::GatewayState;
use crate::websocket::WebSocketHub;

/// Coordinator for graceful shutdown.
///
/// Cloned into every task that may start shutdown (signal handler, control
/// plane); all clones drive the same flag, hub and token.
#[derive(Clone)]
pub struct Shutdown {
    state: Arc<GatewayState>,
    hub: Arc<WebSocketHub>,
    token: CancellationToken,
}

impl Shutdown {
    pub fn new(state: Arc<GatewayState>, hub: Arc<WebSocketHub>) -> Self {
        Self {
            state,
            hub,
            token: CancellationToken::new(),
        }
    }

    /// Token cancelled once shutdown has been triggered.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn is_triggered(&self) -> bool {
        self.state.is_shutting_down()
    }

    /// Start shutdown. Returns false if it was already under way.
    pub fn trigger(&self) -> bool {
        if !self.state.begin_shutdown() {
            return false;
        }
        tracing::info!(websocket_connections = self.hub.connection_count(), "Shutting down");
        self.hub.stop();
        self.token.cancel();
        true
    }
}
