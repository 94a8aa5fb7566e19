//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

use media_gateway::config::{self, GatewayConfig, SharedConfig};
use media_gateway::dispatch::{GatewayState, RequestGateway};
use media_gateway::handlers::default_route_table;
use media_gateway::http::HttpServer;
use media_gateway::lifecycle::Shutdown;
use media_gateway::websocket::{KeepAliveListener, WebSocketHub};

/// A gateway serving on an ephemeral loopback port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub config: SharedConfig,
    pub state: Arc<GatewayState>,
    pub hub: Arc<WebSocketHub>,
    pub shutdown: Shutdown,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn ws_url(&self, path: &str) -> String {
        format!("ws://{}{}", self.addr, path)
    }
}

/// Start the full server stack with the default system routes.
pub async fn start_server(config: GatewayConfig) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shared = config::shared(config);
    let state = Arc::new(GatewayState::new());
    let hub = WebSocketHub::new(16);
    hub.add_listener(Arc::new(KeepAliveListener));

    let table = Arc::new(default_route_table(&shared));
    let gateway = RequestGateway::new(shared.clone(), state.clone(), table);
    let shutdown = Shutdown::new(state.clone(), hub.clone());

    let server = HttpServer::new(gateway, hub.clone(), shutdown.token());
    tokio::spawn(async move {
        let _ = server.run(listener).await;
    });

    TestServer {
        addr,
        config: shared,
        state,
        hub,
        shutdown,
    }
}

/// Client that reports redirects instead of following them.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}

/// Poll `condition` until it holds or two seconds pass.
pub async fn eventually<F>(mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    for _ in 0..100 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    condition()
}
