//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!     → shared via Arc<ArcSwap<_>> to all subsystems
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → atomic swap of Arc<GatewayConfig>
//!     → next dispatch observes new config
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

use arc_swap::ArcSwap;
use std::sync::Arc;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::GatewayConfig;
pub use schema::{HttpsConfig, ListenerConfig, LoggingConfig, NetworkConfig, RoutingConfig};
pub use watcher::ConfigWatcher;

/// Live configuration handle. Readers `load()` a snapshot per operation.
pub type SharedConfig = Arc<ArcSwap<GatewayConfig>>;

/// Wrap a configuration in a shared, swappable handle.
pub fn shared(config: GatewayConfig) -> SharedConfig {
    Arc::new(ArcSwap::from_pointee(config))
}
