use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};

use crate::admin::AdminState;

#[derive(Debug, Serialize, Deserialize)]
pub struct SystemStatus {
    pub version: String,
    pub status: String,
    pub websocket_connections: usize,
    pub override_active: bool,
}

pub async fn get_status(State(state): State<AdminState>) -> Json<SystemStatus> {
    let status = if state.gateway.is_shutting_down() {
        "shutting_down"
    } else {
        "operational"
    };
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION").to_string(),
        status: status.to_string(),
        websocket_connections: state.hub.connection_count(),
        override_active: state.gateway.global_response().is_some(),
    })
}

/// The request body becomes the HTML served while the override is active.
pub async fn set_override(State(state): State<AdminState>, body: String) -> StatusCode {
    if body.trim().is_empty() {
        return StatusCode::BAD_REQUEST;
    }
    tracing::info!(bytes = body.len(), "Global response override set");
    state.gateway.set_global_response(Some(body));
    StatusCode::NO_CONTENT
}

pub async fn clear_override(State(state): State<AdminState>) -> StatusCode {
    tracing::info!("Global response override cleared");
    state.gateway.set_global_response(None);
    StatusCode::NO_CONTENT
}

pub async fn trigger_shutdown(State(state): State<AdminState>) -> StatusCode {
    if state.shutdown.trigger() {
        StatusCode::ACCEPTED
    } else {
        StatusCode::CONFLICT
    }
}
