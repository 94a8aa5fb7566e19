//! Registry of live WebSocket connections.
//!
//! # Responsibilities
//! - Accept upgraded connections and track them until they close
//! - Fan inbound messages out to every listener concurrently
//! - Broadcast server messages to all open connections
//! - Close everything on stop
//!
//! # Design Decisions
//! - Stop snapshots and clears the registry under the lock, then closes
//!   each connection outside it
//! - Messages arriving after stop are dropped
//! - Accept opens and registers a connection under the registry lock, so
//!   a connection handed out by accept is always seen by stop

use async_trait::async_trait;
use futures_util::future::join_all;
use serde_json::Value;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock, Weak};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::dispatch::error::BoxError;
use crate::observability::metrics;
use crate::websocket::connection::{Transport, WebSocketConnection};
use crate::websocket::message::{Frame, IncomingMessage, WebSocketMessage};
use crate::websocket::WsError;

/// Receives every inbound message while the hub is running.
#[async_trait]
pub trait WebSocketListener: Send + Sync {
    async fn on_message(&self, message: &IncomingMessage) -> Result<(), BoxError>;
}

/// Connection lifecycle notifications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HubEvent {
    Connected { id: Uuid, remote: SocketAddr },
    Disconnected { id: Uuid },
}

pub struct WebSocketHub {
    connections: Mutex<HashMap<Uuid, Arc<WebSocketConnection>>>,
    listeners: RwLock<Vec<Arc<dyn WebSocketListener>>>,
    disposed: AtomicBool,
    events: broadcast::Sender<HubEvent>,
}

impl WebSocketHub {
    pub fn new(event_capacity: usize) -> Arc<Self> {
        let (events, _) = broadcast::channel(event_capacity.max(1));
        Arc::new(Self {
            connections: Mutex::new(HashMap::new()),
            listeners: RwLock::new(Vec::new()),
            disposed: AtomicBool::new(false),
            events,
        })
    }

    pub fn add_listener(&self, listener: Arc<dyn WebSocketListener>) {
        self.listeners
            .write()
            .unwrap_or_else(|p| p.into_inner())
            .push(listener);
    }

    /// Receive connect/disconnect events from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<HubEvent> {
        self.events.subscribe()
    }

    pub fn connection_count(&self) -> usize {
        self.registry().len()
    }

    pub fn get(&self, id: Uuid) -> Option<Arc<WebSocketConnection>> {
        self.registry().get(&id).cloned()
    }

    pub fn is_stopped(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }

    /// Register a freshly upgraded socket and mark it open.
    ///
    /// Fails with `HubStopped` after [`stop`](Self::stop); the transport is
    /// released in that case.
    pub fn accept(
        self: &Arc<Self>,
        remote: SocketAddr,
        query: Vec<(String, String)>,
        transport: Box<dyn Transport>,
    ) -> Result<Arc<WebSocketConnection>, WsError> {
        let connection = Arc::new(WebSocketConnection::new(remote, query, transport));
        let id = connection.id();

        let hub: Weak<Self> = Arc::downgrade(self);
        connection.on_close(move |closed| {
            if let Some(hub) = hub.upgrade() {
                hub.remove(closed.id());
            }
        });

        // Open, register and announce under the registry lock, so a
        // concurrent stop either refuses the connection or drains it after
        // its Connected event.
        let count = {
            let mut connections = self.registry();
            if self.is_stopped() || !connection.mark_open() {
                None
            } else {
                connections.insert(id, Arc::clone(&connection));
                let _ = self.events.send(HubEvent::Connected { id, remote });
                Some(connections.len())
            }
        };
        let Some(count) = count else {
            connection.close();
            return Err(WsError::HubStopped);
        };

        metrics::set_websocket_connections(count);
        tracing::info!(connection_id = %id, remote = %remote, connections = count, "WebSocket connection opened");

        Ok(connection)
    }

    /// Deliver one inbound frame to every listener and wait for all of them.
    pub async fn on_message(&self, connection: &Arc<WebSocketConnection>, frame: Frame) {
        if self.is_stopped() {
            tracing::debug!(connection_id = %connection.id(), "Hub stopped, dropping WebSocket message");
            return;
        }
        metrics::record_websocket_message();

        let message = IncomingMessage::new(Arc::clone(connection), frame);
        let listeners: Vec<Arc<dyn WebSocketListener>> = self
            .listeners
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .clone();

        join_all(listeners.iter().map(|listener| {
            let message = &message;
            async move {
                if let Err(e) = listener.on_message(message).await {
                    tracing::error!(
                        connection_id = %message.connection.id(),
                        message_type = message.message_type().unwrap_or(""),
                        error = %e,
                        "WebSocket listener failed"
                    );
                }
            }
        }))
        .await;
    }

    /// Send a message to every open connection. Returns how many took it.
    pub fn broadcast(&self, message_type: &str, data: Value) -> Result<usize, WsError> {
        let frame = WebSocketMessage::new(message_type, data).to_frame()?;
        let targets: Vec<Arc<WebSocketConnection>> = self.registry().values().cloned().collect();

        let mut delivered = 0;
        for connection in targets {
            match connection.send(frame.clone()) {
                Ok(()) => delivered += 1,
                Err(e) => tracing::debug!(connection_id = %connection.id(), error = %e, "Broadcast skipped connection"),
            }
        }
        Ok(delivered)
    }

    /// Close every connection and refuse new ones. Later calls do nothing.
    pub fn stop(&self) {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return;
        }

        let snapshot: Vec<Arc<WebSocketConnection>> = {
            let mut connections = self.registry();
            connections.drain().map(|(_, c)| c).collect()
        };

        tracing::info!(connections = snapshot.len(), "Stopping WebSocket hub");
        for connection in snapshot {
            if connection.close() {
                let _ = self.events.send(HubEvent::Disconnected { id: connection.id() });
            }
        }
        metrics::set_websocket_connections(0);
    }

    fn remove(&self, id: Uuid) {
        let removed = self.registry().remove(&id).is_some();
        if removed {
            let count = self.connection_count();
            metrics::set_websocket_connections(count);
            let _ = self.events.send(HubEvent::Disconnected { id });
            tracing::debug!(connection_id = %id, connections = count, "WebSocket connection removed");
        }
    }

    fn registry(&self) -> std::sync::MutexGuard<'_, HashMap<Uuid, Arc<WebSocketConnection>>> {
        self.connections.lock().unwrap_or_else(|p| p.into_inner())
    }
}
