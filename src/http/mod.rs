//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, catch-all route, WebSocket routes)
//!     → request.rs (buffer body, resolve caller address, absolute URL)
//!     → [dispatch gateway runs the pipeline]
//!     → response.rs (status, headers, body) → Axum response
//!
//! WebSocket paths:
//!     → websocket.rs (admission, handshake, frame pump) → hub
//! ```
//!
//! codec.rs and query.rs are helpers shared with handlers and logging.

pub mod codec;
pub mod query;
pub mod request;
pub mod response;
pub mod server;
pub mod websocket;

pub use request::InboundRequest;
pub use response::OutboundResponse;
pub use server::{AppState, HttpServer};
