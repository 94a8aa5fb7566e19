//! Request-dispatch gateway for a media server's HTTP front door.

pub mod admin;
pub mod config;
pub mod dispatch;
pub mod filters;
pub mod handlers;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;
pub mod security;
pub mod websocket;

pub use config::schema::GatewayConfig;
pub use dispatch::{GatewayError, GatewayState, RequestGateway};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use websocket::WebSocketHub;
