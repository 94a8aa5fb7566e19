//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): dispatches by method and status
//! - `gateway_request_duration_seconds` (histogram): dispatch latency
//! - `gateway_slow_requests_total` (counter): dispatches over the slow threshold
//! - `gateway_websocket_connections` (gauge): open WebSocket connections
//! - `gateway_websocket_messages_total` (counter): inbound WebSocket messages
//!
//! # Design Decisions
//! - Exporter is optional; recording without it costs nothing
//! - Method and status are the only labels (bounded cardinality)

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Duration;

/// Install the Prometheus recorder with an HTTP listener on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| e.to_string())?;

    describe_counter!("gateway_requests_total", "Requests dispatched by method and status");
    describe_histogram!("gateway_request_duration_seconds", "Dispatch duration in seconds");
    describe_counter!("gateway_slow_requests_total", "Requests slower than the slow threshold");
    describe_gauge!("gateway_websocket_connections", "Open WebSocket connections");
    describe_counter!("gateway_websocket_messages_total", "Inbound WebSocket messages");

    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_request(method: &str, status: u16, elapsed: Duration) {
    counter!(
        "gateway_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("gateway_request_duration_seconds").record(elapsed.as_secs_f64());
}

pub fn record_slow_request() {
    counter!("gateway_slow_requests_total").increment(1);
}

pub fn set_websocket_connections(count: usize) {
    gauge!("gateway_websocket_connections").set(count as f64);
}

pub fn record_websocket_message() {
    counter!("gateway_websocket_messages_total").increment(1);
}
