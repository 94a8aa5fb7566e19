//! Cross-origin header handling.
//!
//! # Responsibilities
//! - Answer CORS preflight requests with a fixed permissive header set
//! - Provide the header names clients use to send auth tokens
//!
//! # Design Decisions
//! - Preflight answers are identical for every path
//! - Token headers are listed explicitly so browsers may send them

use axum::http::header::{
    HeaderName, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
    ACCESS_CONTROL_ALLOW_ORIGIN,
};
use axum::http::HeaderValue;

/// Header carrying a bare access token.
pub const TOKEN_HEADER: &str = "X-MediaBrowser-Token";

/// Alternate token header sent by newer clients.
pub const EMBY_TOKEN_HEADER: &str = "X-Emby-Token";

/// Structured client authorization header.
pub const AUTHORIZATION_HEADER: &str = "X-Emby-Authorization";

pub const ALLOW_ORIGIN: &str = "*";
pub const ALLOW_METHODS: &str = "GET, POST, PUT, DELETE, PATCH, OPTIONS";
pub const ALLOW_HEADERS: &str =
    "Content-Type, Authorization, Range, X-MediaBrowser-Token, X-Emby-Authorization";

/// Headers written in answer to an OPTIONS request.
pub fn preflight_headers() -> [(HeaderName, HeaderValue); 3] {
    [
        (ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static(ALLOW_ORIGIN)),
        (ACCESS_CONTROL_ALLOW_METHODS, HeaderValue::from_static(ALLOW_METHODS)),
        (ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static(ALLOW_HEADERS)),
    ]
}
