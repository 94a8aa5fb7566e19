//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → validator.rs (host header, remote access, SSL requirement)
//!         → network.rs (private / local network / subnet classification)
//!     → headers.rs (CORS preflight answers)
//!     → Pass to routing
//! ```
//!
//! # Design Decisions
//! - Checks run before any handler code
//! - Fail closed: reject on any security check failure
//! - No trust in client input

pub mod headers;
pub mod network;
pub mod validator;

pub use network::{NetworkClassifier, SubnetClassifier};
pub use validator::SecurityValidator;
