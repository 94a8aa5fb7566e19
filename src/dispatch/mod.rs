//! Request dispatch subsystem.
//!
//! # Data Flow
//! ```text
//! InboundRequest
//!     → gateway.rs (admission, SSL, preflight, legacy, override)
//!     → routing (resolve) → filters → handler → response filters
//!     → error.rs (classify failures) → sanitize.rs (strip server paths)
//!     → OutboundResponse
//!
//! state.rs: shutdown flag + global override, read on every dispatch
//! ```
//!
//! # Design Decisions
//! - One gateway instance per server, shared by all connections
//! - Mode switches live in an injected state object, not in globals

pub mod error;
pub mod gateway;
pub mod sanitize;
pub mod state;

pub use error::{classify, severity, GatewayError, ResponseStarted, Severity};
pub use gateway::{Rejection, RequestGateway};
pub use sanitize::MessageSanitizer;
pub use state::GatewayState;
