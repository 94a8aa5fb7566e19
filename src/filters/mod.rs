//! Request and response filter subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     FilterRegistry (type name → descriptors)
//!     → RouteTableBuilder merges request-type + handler-type filters per route
//!     → stable sort by priority, stored on the RouteDescriptor
//!
//! Per dispatch:
//!     chain.rs: request filters priority < 0
//!     → request filters priority ≥ 0
//!     → handler
//!     → global response filters (fixed order)
//! ```
//!
//! # Design Decisions
//! - Discovery is a startup registration table, dispatch is a pure lookup
//! - Negative priorities (authentication) always precede business filters
//! - Filter failures travel the same error path as handler failures

pub mod builtin;
pub mod chain;
pub mod registry;

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

use crate::dispatch::GatewayError;
use crate::http::response::OutboundResponse;
use crate::http::InboundRequest;
use crate::routing::handler::RequestContext;

pub use builtin::{ApiKeyFilter, StandardHeadersFilter};
pub use chain::FilterChain;
pub use registry::{FilterRegistry, FilterRegistryBuilder};

/// Whether the chain should continue after a request filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOutcome {
    Continue,
    /// The filter wrote a complete response; skip the handler.
    Halt,
}

/// Logic run before the handler.
#[async_trait]
pub trait RequestFilter: Send + Sync {
    async fn apply(
        &self,
        ctx: &RequestContext<'_>,
        response: &mut OutboundResponse,
    ) -> Result<FilterOutcome, GatewayError>;
}

/// Logic run after the handler, for every route.
#[async_trait]
pub trait ResponseFilter: Send + Sync {
    async fn apply(
        &self,
        request: &InboundRequest,
        response: &mut OutboundResponse,
    ) -> Result<(), GatewayError>;
}

/// A request filter with its priority.
#[derive(Clone)]
pub struct FilterDescriptor {
    pub name: String,
    pub priority: i32,
    pub filter: Arc<dyn RequestFilter>,
}

impl FilterDescriptor {
    pub fn new(name: impl Into<String>, priority: i32, filter: Arc<dyn RequestFilter>) -> Self {
        Self {
            name: name.into(),
            priority,
            filter,
        }
    }
}

impl fmt::Debug for FilterDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterDescriptor")
            .field("name", &self.name)
            .field("priority", &self.priority)
            .finish()
    }
}
