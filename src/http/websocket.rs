//! WebSocket upgrade handling.
//!
//! # Responsibilities
//! - Admit upgrade requests through the gateway's security checks
//! - Complete the handshake and hand the socket to the hub
//! - Pump frames between the socket and the hub
//!
//! # Data Flow
//! ```text
//! Client ──frames──▶ reader loop ──▶ hub.on_message ──▶ listeners
//! Client ◀──frames── writer task ◀── ChannelTransport ◀── connection.send
//! ```
//!
//! # Design Decisions
//! - Writes go through a bounded queue so the hub never awaits socket I/O;
//!   a peer that falls a full queue behind loses frames instead of memory
//! - Releasing the transport sends a close frame and ends the writer
//! - Requests without upgrade headers fall through to normal dispatch

use axum::body::Body;
use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{ConnectInfo, State};
use axum::http::Request;
use axum::response::{IntoResponse, Response};
use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio_util::sync::CancellationToken;

use crate::http::server::{dispatch_inbound, read_request, AppState};
use crate::websocket::{Frame, Transport, WebSocketHub, WsError};

enum Outgoing {
    Frame(Frame),
    Close,
}

/// Transport feeding the socket writer task through a bounded queue.
struct ChannelTransport {
    tx: mpsc::Sender<Outgoing>,
    /// Cancelled when a close could not be queued behind a full queue.
    abort: CancellationToken,
}

impl ChannelTransport {
    fn new(capacity: usize) -> (Self, mpsc::Receiver<Outgoing>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let transport = Self {
            tx,
            abort: CancellationToken::new(),
        };
        (transport, rx)
    }
}

impl Transport for ChannelTransport {
    /// Refuses the frame when the peer has fallen a full queue behind.
    fn send(&self, frame: Frame) -> Result<(), WsError> {
        self.tx.try_send(Outgoing::Frame(frame)).map_err(|e| match e {
            TrySendError::Full(_) => WsError::SendFailed("send queue is full".to_string()),
            TrySendError::Closed(_) => WsError::SendFailed("socket writer has stopped".to_string()),
        })
    }

    /// Queues a close behind pending frames, or drops them when the queue
    /// is full.
    fn release(&self) -> Result<(), WsError> {
        match self.tx.try_send(Outgoing::Close) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                self.abort.cancel();
                Ok(())
            }
            Err(TrySendError::Closed(_)) => Err(WsError::ReleaseFailed("socket writer has stopped".to_string())),
        }
    }
}

/// Handler for the configured WebSocket paths.
pub async fn upgrade_handler(
    State(state): State<AppState>,
    ConnectInfo(remote): ConnectInfo<SocketAddr>,
    upgrade: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
    request: Request<Body>,
) -> Response {
    let inbound = match read_request(&state, request, remote).await {
        Ok(inbound) => inbound,
        Err(response) => return response,
    };

    let upgrade = match upgrade {
        Ok(upgrade) => upgrade,
        Err(_) => return dispatch_inbound(&state, &inbound).await,
    };

    if let Err(rejection) = state.gateway.admit_upgrade(&inbound) {
        tracing::debug!(remote = %remote, reason = %rejection, "WebSocket upgrade refused");
        return (rejection.status(), rejection.message()).into_response();
    }

    let hub = Arc::clone(&state.hub);
    let peer = SocketAddr::new(inbound.remote_ip(), remote.port());
    let query = inbound.query_params().to_vec();
    let capacity = state.config.load().websocket.send_queue_capacity;
    upgrade.on_upgrade(move |socket| serve_socket(hub, socket, peer, query, capacity))
}

async fn serve_socket(
    hub: Arc<WebSocketHub>,
    socket: WebSocket,
    remote: SocketAddr,
    query: Vec<(String, String)>,
    capacity: usize,
) {
    let (mut sink, mut stream) = socket.split();
    let (transport, mut rx) = ChannelTransport::new(capacity);
    let abort = transport.abort.clone();

    let writer = tokio::spawn(async move {
        loop {
            let outgoing = tokio::select! {
                biased;
                _ = abort.cancelled() => Outgoing::Close,
                outgoing = rx.recv() => match outgoing {
                    Some(outgoing) => outgoing,
                    None => break,
                },
            };
            let message = match outgoing {
                Outgoing::Frame(Frame::Text(text)) => Message::Text(text.into()),
                Outgoing::Frame(Frame::Binary(bytes)) => Message::Binary(bytes),
                Outgoing::Close => {
                    let _ = sink.send(Message::Close(None)).await;
                    break;
                }
            };
            if let Err(e) = sink.send(message).await {
                tracing::debug!(error = %e, "WebSocket write failed");
                break;
            }
        }
    });

    let connection = match hub.accept(remote, query, Box::new(transport)) {
        Ok(connection) => connection,
        Err(e) => {
            tracing::debug!(remote = %remote, error = %e, "WebSocket connection refused");
            let _ = writer.await;
            return;
        }
    };

    while let Some(received) = stream.next().await {
        match received {
            Ok(Message::Text(text)) => hub.on_message(&connection, Frame::Text(text.as_str().to_string())).await,
            Ok(Message::Binary(bytes)) => hub.on_message(&connection, Frame::Binary(bytes)).await,
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(connection_id = %connection.id(), error = %e, "WebSocket read failed");
                break;
            }
        }
        if !connection.is_open() {
            break;
        }
    }

    connection.close();
    let _ = writer.await;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn queued(rx: &mut mpsc::Receiver<Outgoing>) -> Vec<&'static str> {
        let mut seen = Vec::new();
        while let Ok(outgoing) = rx.try_recv() {
            seen.push(match outgoing {
                Outgoing::Frame(_) => "frame",
                Outgoing::Close => "close",
            });
        }
        seen
    }

    #[test]
    fn full_queue_refuses_frames() {
        let (transport, mut rx) = ChannelTransport::new(2);
        transport.send(Frame::Text("a".into())).unwrap();
        transport.send(Frame::Text("b".into())).unwrap();

        let err = transport.send(Frame::Text("c".into())).unwrap_err();
        assert!(matches!(err, WsError::SendFailed(ref m) if m == "send queue is full"));
        assert_eq!(queued(&mut rx), vec!["frame", "frame"]);
    }

    #[test]
    fn close_follows_pending_frames() {
        let (transport, mut rx) = ChannelTransport::new(4);
        transport.send(Frame::Text("a".into())).unwrap();
        transport.release().unwrap();

        assert!(!transport.abort.is_cancelled());
        assert_eq!(queued(&mut rx), vec!["frame", "close"]);
    }

    #[test]
    fn close_on_full_queue_aborts_the_writer() {
        let (transport, _rx) = ChannelTransport::new(1);
        transport.send(Frame::Text("a".into())).unwrap();
        transport.release().unwrap();
        assert!(transport.abort.is_cancelled());
    }

    #[test]
    fn stopped_writer_fails_both_ways() {
        let (transport, rx) = ChannelTransport::new(1);
        drop(rx);
        assert!(matches!(transport.send(Frame::Text("a".into())), Err(WsError::SendFailed(_))));
        assert!(matches!(transport.release(), Err(WsError::ReleaseFailed(_))));
    }
}
