//! Handlers the gateway ships with.
//!
//! Application handlers are registered by the embedding server; these keep
//! the standalone binary useful (liveness checks, discovery).

pub mod system;

use axum::http::Method;

use crate::config::SharedConfig;
use crate::filters::builtin::AUTH_PRIORITY;
use crate::filters::{ApiKeyFilter, FilterRegistry};
use crate::routing::{RouteEntry, StaticRouteTable};

pub use system::{PingHandler, PublicInfoHandler, SystemInfoHandler};

/// Route table with the system endpoints. `SystemInfoHandler` requires an
/// API key when keys are configured.
pub fn default_route_table(config: &SharedConfig) -> StaticRouteTable {
    let snapshot = config.load();
    let filters = FilterRegistry::builder()
        .register("SystemInfoHandler", "ApiKeyFilter", AUTH_PRIORITY, ApiKeyFilter::new(config.clone()))
        .build();

    StaticRouteTable::builder()
        .filters(filters)
        .legacy_prefixes(snapshot.routing.legacy_route_prefixes)
        .route(RouteEntry::new("/System/Ping", PingHandler::new(config.clone())).methods([Method::GET, Method::POST]))
        .route(RouteEntry::new("/System/Info/Public", PublicInfoHandler::new(config.clone())).methods([Method::GET]))
        .route(RouteEntry::new("/System/Info", SystemInfoHandler::new(config.clone())).methods([Method::GET]))
        .build()
}
