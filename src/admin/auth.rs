use axum::{
    body::Body,
    extract::State,
    http::{header::AUTHORIZATION, Request, StatusCode},
    middleware::Next,
    response::Response,
};

use crate::admin::AdminState;
use crate::filters::builtin::secrets_match;

pub async fn admin_auth_middleware(
    State(state): State<AdminState>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let api_key = state.config.load().admin.api_key.clone();
    if api_key.is_empty() {
        tracing::warn!(path = %request.uri().path(), "Control plane has no API key configured");
        return Err(StatusCode::UNAUTHORIZED);
    }
    let expected = format!("Bearer {api_key}");

    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    if auth_header.is_some_and(|presented| secrets_match(&expected, presented)) {
        return Ok(next.run(request).await);
    }

    tracing::warn!(path = %request.uri().path(), "Rejected control plane request");
    Err(StatusCode::UNAUTHORIZED)
}
