//! Control plane.
//!
//! # Data Flow
//! ```text
//! gateway-ctl / operator
//!     → auth.rs (Bearer API key)
//!     → handlers.rs
//!         status   → GatewayState + WebSocketHub
//!         override → GatewayState::set_global_response
//!         shutdown → Shutdown::trigger
//! ```
//!
//! # Design Decisions
//! - Separate listener from client traffic, disabled by default
//! - Reads the API key from the live config on every request

pub mod auth;
pub mod handlers;

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;

use crate::config::SharedConfig;
use crate::dispatch::GatewayState;
use crate::lifecycle::Shutdown;
use crate::websocket::WebSocketHub;

use self::auth::admin_auth_middleware;
use self::handlers::{clear_override, get_status, set_override, trigger_shutdown};

/// State shared by control plane handlers.
#[derive(Clone)]
pub struct AdminState {
    pub config: SharedConfig,
    pub gateway: Arc<GatewayState>,
    pub hub: Arc<WebSocketHub>,
    pub shutdown: Shutdown,
}

pub fn setup_admin_router(state: AdminState) -> Router {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/override", put(set_override).delete(clear_override))
        .route("/admin/shutdown", post(trigger_shutdown))
        .layer(middleware::from_fn_with_state(state.clone(), admin_auth_middleware))
        .with_state(state)
}
