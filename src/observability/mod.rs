//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! RequestGateway::dispatch ─┬─▶ tracing events (slow requests, error severity)
//!                           └─▶ metrics.rs (request count, latency, slow count)
//! WebSocketHub            ─┬─▶ tracing events (open, close, listener failures)
//!                           └─▶ metrics.rs (connection gauge, message count)
//! TraceLayer (axum)         ──▶ per-request spans
//!
//! logging.rs  ──▶ stdout (pretty or JSON lines)
//! metrics.rs  ──▶ Prometheus scrape listener
//! ```
//!
//! # Design Decisions
//! - `RUST_LOG` wins over the configured level
//! - Without an installed recorder every metrics call is a no-op, so tests
//!   and library users need no setup

pub mod logging;
pub mod metrics;
