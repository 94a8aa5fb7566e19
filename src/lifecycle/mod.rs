//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Shutdown::trigger
//!
//! Shutdown (shutdown.rs):
//!     set gateway shutdown flag (new requests get 503)
//!     → stop WebSocket hub (close every connection)
//!     → cancel server token (graceful axum stop, in-flight cancellation)
//! ```
//!
//! # Design Decisions
//! - Ordered shutdown: refuse new work, close long-lived sockets, drain
//! - Triggering more than once is harmless

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
pub use signals::wait_for_signal;
