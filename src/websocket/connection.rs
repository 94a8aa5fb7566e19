//! A single WebSocket connection and its lifecycle.
//!
//! # Responsibilities
//! - Track the `Connecting → Open → Closed` state
//! - Send frames through the owned transport while open
//! - Notify close observers and release the transport exactly once
//!
//! # Design Decisions
//! - The transport is synchronous (a queue in front of the socket writer),
//!   so closing never awaits and can run from any context
//! - Observers registered after close run immediately

use std::fmt;
use std::net::SocketAddr;
use std::sync::Mutex;
use std::time::Instant;
use uuid::Uuid;

use crate::websocket::message::{Frame, WebSocketMessage};
use crate::websocket::WsError;

/// Lifecycle of a connection. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Open,
    Closed,
}

/// The socket behind a connection.
pub trait Transport: Send + Sync {
    /// Queue a frame for the peer.
    fn send(&self, frame: Frame) -> Result<(), WsError>;

    /// Close the socket. Called once, when the connection closes.
    fn release(&self) -> Result<(), WsError>;
}

type CloseObserver = Box<dyn FnOnce(&WebSocketConnection) + Send>;

pub struct WebSocketConnection {
    id: Uuid,
    remote: SocketAddr,
    query: Vec<(String, String)>,
    connected_at: Instant,
    state: Mutex<ConnectionState>,
    observers: Mutex<Vec<CloseObserver>>,
    transport: Box<dyn Transport>,
}

impl WebSocketConnection {
    pub fn new(remote: SocketAddr, query: Vec<(String, String)>, transport: Box<dyn Transport>) -> Self {
        Self {
            id: Uuid::new_v4(),
            remote,
            query,
            connected_at: Instant::now(),
            state: Mutex::new(ConnectionState::Connecting),
            observers: Mutex::new(Vec::new()),
            transport,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn remote(&self) -> SocketAddr {
        self.remote
    }

    pub fn query_params(&self) -> &[(String, String)] {
        &self.query
    }

    /// First query value named `key`, ignoring ASCII case.
    pub fn query(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    pub fn connected_at(&self) -> Instant {
        self.connected_at
    }

    pub fn state(&self) -> ConnectionState {
        *lock(&self.state)
    }

    pub fn is_open(&self) -> bool {
        self.state() == ConnectionState::Open
    }

    /// Move from `Connecting` to `Open`. No effect in any other state.
    pub fn mark_open(&self) -> bool {
        let mut state = lock(&self.state);
        if *state == ConnectionState::Connecting {
            *state = ConnectionState::Open;
            true
        } else {
            false
        }
    }

    /// Run `observer` when the connection closes.
    pub fn on_close<F>(&self, observer: F)
    where
        F: FnOnce(&WebSocketConnection) + Send + 'static,
    {
        {
            let state = lock(&self.state);
            if *state != ConnectionState::Closed {
                lock(&self.observers).push(Box::new(observer));
                return;
            }
        }
        observer(self);
    }

    pub fn send(&self, frame: Frame) -> Result<(), WsError> {
        if !self.is_open() {
            return Err(WsError::Closed(self.id));
        }
        self.transport.send(frame)
    }

    pub fn send_message(&self, message: &WebSocketMessage) -> Result<(), WsError> {
        self.send(message.to_frame()?)
    }

    /// Close the connection. Returns true for the call that closed it.
    ///
    /// Observers run before the transport is released; release failures
    /// are logged and discarded.
    pub fn close(&self) -> bool {
        let observers = {
            let mut state = lock(&self.state);
            if *state == ConnectionState::Closed {
                return false;
            }
            *state = ConnectionState::Closed;
            std::mem::take(&mut *lock(&self.observers))
        };

        for observer in observers {
            observer(self);
        }

        if let Err(e) = self.transport.release() {
            tracing::debug!(connection_id = %self.id, error = %e, "Error releasing WebSocket transport");
        }
        tracing::debug!(
            connection_id = %self.id,
            remote = %self.remote,
            duration_ms = self.connected_at.elapsed().as_millis() as u64,
            "WebSocket connection closed"
        );
        true
    }
}

impl fmt::Debug for WebSocketConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebSocketConnection")
            .field("id", &self.id)
            .field("remote", &self.remote)
            .field("state", &self.state())
            .finish()
    }
}

/// Lock ignoring poison; the guarded data stays consistent across panics.
fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Transport recording sent frames and release calls.
    #[derive(Default)]
    pub(crate) struct RecordingTransport {
        pub sent: Mutex<Vec<Frame>>,
        pub releases: AtomicUsize,
        pub fail_release: bool,
    }

    impl Transport for Arc<RecordingTransport> {
        fn send(&self, frame: Frame) -> Result<(), WsError> {
            self.sent.lock().unwrap().push(frame);
            Ok(())
        }

        fn release(&self) -> Result<(), WsError> {
            self.releases.fetch_add(1, Ordering::SeqCst);
            if self.fail_release {
                Err(WsError::ReleaseFailed("socket already gone".into()))
            } else {
                Ok(())
            }
        }
    }

    pub(crate) fn connection() -> (WebSocketConnection, Arc<RecordingTransport>) {
        let transport = Arc::new(RecordingTransport::default());
        let conn = WebSocketConnection::new(
            "192.168.1.20:50000".parse().unwrap(),
            vec![("deviceId".into(), "abc".into())],
            Box::new(Arc::clone(&transport)),
        );
        (conn, transport)
    }

    #[test]
    fn lifecycle_moves_forward_only() {
        let (conn, _) = connection();
        assert_eq!(conn.state(), ConnectionState::Connecting);
        assert!(conn.mark_open());
        assert!(!conn.mark_open());
        assert!(conn.close());
        assert!(!conn.mark_open());
        assert_eq!(conn.state(), ConnectionState::Closed);
    }

    #[test]
    fn close_runs_observers_and_releases_once() {
        let (conn, transport) = connection();
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        conn.on_close(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        });
        conn.mark_open();

        assert!(conn.close());
        assert!(!conn.close());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(transport.releases.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn observer_after_close_runs_immediately() {
        let (conn, _) = connection();
        conn.close();
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        conn.on_close(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn send_requires_open() {
        let (conn, transport) = connection();
        assert!(matches!(conn.send(Frame::Text("early".into())), Err(WsError::Closed(_))));
        conn.mark_open();
        conn.send(Frame::Text("hi".into())).unwrap();
        conn.close();
        assert!(conn.send(Frame::Text("late".into())).is_err());
        assert_eq!(*transport.sent.lock().unwrap(), vec![Frame::Text("hi".into())]);
    }

    #[test]
    fn query_lookup_ignores_case() {
        let (conn, _) = connection();
        assert_eq!(conn.query("DeviceId"), Some("abc"));
        assert_eq!(conn.query("api_key"), None);
    }
}
