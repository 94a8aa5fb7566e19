//! Media server HTTP front door.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client ──▶ http::server ──▶ dispatch::gateway ──▶ security (host, remote access, SSL)
//!                     │                  │
//!                     │                  ├──▶ routing::legacy (redirects, bookmark notices)
//!                     │                  ├──▶ routing::resolver ──▶ route table
//!                     │                  └──▶ filters ──▶ handler ──▶ response filters
//!                     │
//!                     └──▶ http::websocket ──▶ websocket::hub ──▶ listeners
//!
//!     Cross-cutting: config (hot reload), observability, lifecycle, admin
//! ```

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;

use media_gateway::admin::{setup_admin_router, AdminState};
use media_gateway::config::{self, load_config, ConfigWatcher, GatewayConfig};
use media_gateway::dispatch::{GatewayState, RequestGateway};
use media_gateway::handlers::default_route_table;
use media_gateway::http::HttpServer;
use media_gateway::lifecycle::{wait_for_signal, Shutdown};
use media_gateway::observability::{logging, metrics};
use media_gateway::websocket::{KeepAliveListener, WebSocketHub};

#[derive(Parser)]
#[command(name = "media-gateway", version, about = "Media server HTTP front door")]
struct Cli {
    /// TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let initial = match &cli.config {
        Some(path) => load_config(path)?,
        None => GatewayConfig::default(),
    };

    if let Err(e) = logging::init_logging(&initial.logging) {
        eprintln!("Failed to initialize logging: {e}");
    }

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "media-gateway starting");
    tracing::info!(
        bind_address = %initial.listener.bind_address,
        websocket_paths = ?initial.websocket.paths,
        remote_access = initial.network.enable_remote_access,
        "Configuration loaded"
    );

    if initial.observability.metrics_enabled {
        match initial.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics exporter");
                }
            }
            Err(e) => tracing::error!(
                metrics_address = %initial.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let shared = config::shared(initial.clone());

    // Held for the process lifetime; dropping it stops watching.
    let _watcher = match &cli.config {
        Some(path) => match ConfigWatcher::new(path, shared.clone()).run() {
            Ok(watcher) => Some(watcher),
            Err(e) => {
                tracing::warn!(error = %e, "Config hot reload disabled");
                None
            }
        },
        None => None,
    };

    let state = Arc::new(GatewayState::new());
    let hub = WebSocketHub::new(initial.websocket.event_capacity);
    hub.add_listener(Arc::new(KeepAliveListener));

    let table = Arc::new(default_route_table(&shared));
    let gateway = RequestGateway::new(shared.clone(), state.clone(), table);
    let shutdown = Shutdown::new(state.clone(), hub.clone());

    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            wait_for_signal().await;
            shutdown.trigger();
        });
    }

    if initial.admin.enabled {
        let admin = setup_admin_router(AdminState {
            config: shared.clone(),
            gateway: state.clone(),
            hub: hub.clone(),
            shutdown: shutdown.clone(),
        });
        let listener = TcpListener::bind(&initial.admin.bind_address).await?;
        tracing::info!(address = %listener.local_addr()?, "Control plane listening");
        let token = shutdown.token();
        tokio::spawn(async move {
            let served = axum::serve(listener, admin)
                .with_graceful_shutdown(async move { token.cancelled().await })
                .await;
            if let Err(e) = served {
                tracing::error!(error = %e, "Control plane stopped with error");
            }
        });
    }

    let listener = TcpListener::bind(&initial.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let server = HttpServer::new(gateway, hub, shutdown.token());
    server.run(listener).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
