//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address, body limits).
    pub listener: ListenerConfig,

    /// Local network definition and remote access policy.
    pub network: NetworkConfig,

    /// HTTPS redirect policy.
    pub https: HttpsConfig,

    /// Server filesystem paths, stripped from client-visible errors.
    pub paths: PathsConfig,

    /// Legacy redirects and exempt paths.
    pub routing: RoutingConfig,

    /// WebSocket upgrade endpoints.
    pub websocket: WebSocketConfig,

    /// API keys accepted by the key filter.
    pub security: SecurityConfig,

    /// Log output settings.
    pub logging: LoggingConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Control plane settings.
    pub admin: AdminConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8096").
    pub bind_address: String,

    /// Maximum request body size in bytes.
    pub max_body_size: usize,

    /// Server name reported by the system endpoints.
    pub server_name: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8096".to_string(),
            max_body_size: 10 * 1024 * 1024,
            server_name: "Media Server".to_string(),
        }
    }
}

/// Local network definition and remote access policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Addresses the server is reachable at from the local network. When
    /// non-empty, privately-originated requests must use one of them as Host.
    pub local_network_addresses: Vec<String>,

    /// Extra CIDR ranges (or single IPs) treated as local network.
    pub local_network_subnets: Vec<String>,

    /// Allow callers from outside the local network.
    pub enable_remote_access: bool,

    /// CIDR ranges or IPs applied to remote callers.
    pub remote_ip_filter: Vec<String>,

    /// Treat `remote_ip_filter` as a deny list instead of an allow list.
    pub remote_ip_filter_is_blacklist: bool,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            local_network_addresses: Vec::new(),
            local_network_subnets: Vec::new(),
            enable_remote_access: true,
            remote_ip_filter: Vec::new(),
            remote_ip_filter_is_blacklist: false,
        }
    }
}

/// HTTPS redirect policy. TLS itself is terminated elsewhere.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HttpsConfig {
    /// Redirect remote cleartext requests to HTTPS.
    pub require_https: bool,

    /// HTTPS is available at the application level.
    pub enable_https: bool,

    /// A reverse proxy in front of the server owns the scheme.
    pub behind_reverse_proxy: bool,

    /// Port clients use for HTTPS.
    pub public_https_port: u16,
}

impl Default for HttpsConfig {
    fn default() -> Self {
        Self {
            require_https: false,
            enable_https: false,
            behind_reverse_proxy: false,
            public_https_port: 8920,
        }
    }
}

/// Server filesystem locations.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct PathsConfig {
    /// Program installation directory.
    pub installation_path: String,

    /// Program data directory.
    pub data_path: String,
}

/// Legacy redirects and exempt path substrings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Landing page for root and legacy redirects (relative).
    pub default_redirect_path: String,

    /// URL substrings always served over cleartext.
    pub ssl_exempt_paths: Vec<String>,

    /// URL substrings served normally while a global override is set.
    pub override_exempt_paths: Vec<String>,

    /// Also register every route under the legacy prefixes.
    pub legacy_route_prefixes: bool,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            default_redirect_path: "web/index.html".to_string(),
            ssl_exempt_paths: vec!["system/ping".to_string(), "dlna/".to_string()],
            override_exempt_paths: vec!["system/ping".to_string()],
            legacy_route_prefixes: true,
        }
    }
}

/// WebSocket upgrade endpoints.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WebSocketConfig {
    /// Paths accepting WebSocket upgrades.
    pub paths: Vec<String>,

    /// Capacity of the hub's event channel.
    pub event_capacity: usize,

    /// Frames queued per connection before further sends are refused.
    pub send_queue_capacity: usize,
}

impl Default for WebSocketConfig {
    fn default() -> Self {
        Self {
            paths: vec!["/socket".to_string(), "/embywebsocket".to_string()],
            event_capacity: 64,
            send_queue_capacity: 256,
        }
    }
}

/// API keys accepted by the key filter. Empty disables the filter.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct SecurityConfig {
    pub api_keys: Vec<String>,
}

/// Log output settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins.
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    pub json: bool,

    /// Requests slower than this are logged as warnings.
    pub slow_request_threshold_ms: u64,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            slow_request_threshold_ms: 500,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

/// Control plane configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Enable the control plane.
    pub enabled: bool,

    /// API key for authentication (Bearer token).
    pub api_key: String,

    /// Control plane bind address.
    pub bind_address: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            // WARNING: This is a placeholder! Change this in production.
            api_key: "CHANGE_ME_IN_PRODUCTION".to_string(),
            bind_address: "127.0.0.1:8097".to_string(),
        }
    }
}
