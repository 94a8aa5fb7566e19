//! HTTP server setup.
//!
//! # Responsibilities
//! - Create the Axum router: WebSocket paths plus a catch-all dispatch route
//! - Convert Axum requests into `InboundRequest` and back
//! - Give every dispatch a cancellation token tied to server shutdown
//! - Tag every request with an `x-request-id`, echoed on the response
//! - Serve with graceful shutdown

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    response::Response,
    routing::any,
    Router,
};
use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::config::SharedConfig;
use crate::dispatch::RequestGateway;
use crate::http::request::InboundRequest;
use crate::http::response::OutboundResponse;
use crate::http::websocket::upgrade_handler;
use crate::routing::router::LEGACY_PREFIXES;
use crate::websocket::WebSocketHub;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub gateway: RequestGateway,
    pub hub: Arc<WebSocketHub>,
    pub config: SharedConfig,
    /// Cancelled when the server shuts down.
    pub shutdown: CancellationToken,
}

/// HTTP front door of the media server.
pub struct HttpServer {
    router: Router,
    shutdown: CancellationToken,
}

impl HttpServer {
    pub fn new(gateway: RequestGateway, hub: Arc<WebSocketHub>, shutdown: CancellationToken) -> Self {
        let config = gateway.config().clone();
        let state = AppState {
            gateway,
            hub,
            config,
            shutdown: shutdown.clone(),
        };
        let router = Self::build_router(state);
        Self { router, shutdown }
    }

    /// WebSocket paths are fixed at startup, with the same legacy prefixes
    /// as HTTP routes when those are enabled.
    fn build_router(state: AppState) -> Router {
        let config = state.config.load_full();

        let mut seen = HashSet::new();
        let mut router = Router::new();
        for path in &config.websocket.paths {
            let mut variants = vec![path.clone()];
            if config.routing.legacy_route_prefixes {
                variants.extend(LEGACY_PREFIXES.iter().map(|prefix| format!("{prefix}{path}")));
            }
            for variant in variants {
                if seen.insert(variant.clone()) {
                    router = router.route(&variant, any(upgrade_handler));
                }
            }
        }

        router
            .route("/", any(dispatch_handler))
            .route("/{*path}", any(dispatch_handler))
            .with_state(state)
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// The router, for serving on a custom listener or in tests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve until the shutdown token is cancelled.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        let shutdown = self.shutdown;
        axum::serve(listener, app)
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Catch-all handler: every non-WebSocket request goes through the gateway.
async fn dispatch_handler(
    State(state): State<AppState>,
    ConnectInfo(remote): ConnectInfo<SocketAddr>,
    request: Request<Body>,
) -> Response {
    match read_request(&state, request, remote).await {
        Ok(inbound) => dispatch_inbound(&state, &inbound).await,
        Err(response) => response,
    }
}

/// Buffer the request with the live body limit and proxy settings.
///
/// Unreadable requests are answered by the gateway so shutdown, metrics and
/// the error boundary still apply.
pub(crate) async fn read_request(
    state: &AppState,
    request: Request<Body>,
    remote: SocketAddr,
) -> Result<InboundRequest, Response> {
    let config = state.config.load_full();
    let method = request.method().clone();
    let target = request.uri().to_string();
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    InboundRequest::from_http(
        request,
        remote,
        config.listener.max_body_size,
        config.https.behind_reverse_proxy,
    )
    .await
    .map_err(|e| {
        tracing::debug!(remote = %remote, error = %e, "Unreadable request");
        state
            .gateway
            .reject_unreadable(&method, &target, remote.ip(), request_id.as_deref(), e)
            .into_http()
    })
}

pub(crate) async fn dispatch_inbound(state: &AppState, inbound: &InboundRequest) -> Response {
    let cancel = state.shutdown.child_token();
    let mut response = OutboundResponse::new();
    state.gateway.dispatch(inbound, &mut response, &cancel).await;
    response.into_http()
}
