//! Route table and its startup builder.
//!
//! # Responsibilities
//! - Store compiled routes
//! - Look up the route for a (verb, sanitized path) pair
//! - Expand each declared route under the legacy URL prefixes
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - Legacy prefixes are expanded at registration, not rewritten per request
//! - More literal segments win; ties keep registration order
//! - Explicit None rather than silent default

use axum::http::Method;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use crate::filters::{FilterDescriptor, FilterRegistry};
use crate::routing::handler::{Handler, PathParams};
use crate::routing::matcher::PathPattern;

/// Prefixes every declared route is also registered under.
pub const LEGACY_PREFIXES: [&str; 3] = ["/emby", "/mediabrowser", "/emby/emby"];

/// Maps (verb, path) to a handler.
pub trait RouteTable: Send + Sync {
    fn lookup(&self, method: &Method, path: &str) -> Option<RouteMatch>;
}

/// A matched route and the parameters captured from the path.
#[derive(Debug, Clone)]
pub struct RouteMatch {
    pub route: Arc<RouteDescriptor>,
    pub params: PathParams,
}

/// A declared route with its handler and precomputed request filters.
pub struct RouteDescriptor {
    /// Pattern as declared, without legacy prefixes.
    pub pattern: PathPattern,
    /// Accepted verbs; empty accepts any.
    pub methods: Vec<Method>,
    pub request_type: String,
    pub handler_type: String,
    pub handler: Arc<dyn Handler>,
    /// Sorted by ascending priority.
    pub filters: Vec<FilterDescriptor>,
}

impl RouteDescriptor {
    pub fn accepts(&self, method: &Method) -> bool {
        self.methods.is_empty()
            || self.methods.contains(method)
            || (method == Method::HEAD && self.methods.contains(&Method::GET))
    }
}

impl fmt::Debug for RouteDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteDescriptor")
            .field("pattern", &self.pattern.as_str())
            .field("methods", &self.methods)
            .field("request_type", &self.request_type)
            .field("handler_type", &self.handler_type)
            .field("filters", &self.filters)
            .finish()
    }
}

/// A route declaration fed to [`RouteTableBuilder`].
pub struct RouteEntry {
    pattern: String,
    methods: Vec<Method>,
    request_type: Option<String>,
    handler_type: String,
    handler: Arc<dyn Handler>,
}

impl RouteEntry {
    pub fn new<H>(pattern: &str, handler: H) -> Self
    where
        H: Handler + 'static,
    {
        Self {
            pattern: pattern.to_string(),
            methods: Vec::new(),
            request_type: None,
            handler_type: short_type_name::<H>().to_string(),
            handler: Arc::new(handler),
        }
    }

    pub fn methods(mut self, methods: impl IntoIterator<Item = Method>) -> Self {
        self.methods = methods.into_iter().collect();
        self
    }

    /// Name of the request-payload type, used for filter lookup.
    pub fn request_type(mut self, name: &str) -> Self {
        self.request_type = Some(name.to_string());
        self
    }
}

fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

struct Entry {
    pattern: PathPattern,
    route: Arc<RouteDescriptor>,
}

/// Read-only route table built once at startup.
pub struct StaticRouteTable {
    entries: Vec<Entry>,
}

impl StaticRouteTable {
    pub fn builder() -> RouteTableBuilder {
        RouteTableBuilder::default()
    }

    /// Number of concrete entries, including legacy expansions.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl RouteTable for StaticRouteTable {
    fn lookup(&self, method: &Method, path: &str) -> Option<RouteMatch> {
        self.entries
            .iter()
            .filter(|e| e.route.accepts(method))
            .find_map(|e| {
                e.pattern.matches(path).map(|params| RouteMatch {
                    route: Arc::clone(&e.route),
                    params,
                })
            })
    }
}

/// Collects route declarations and compiles them into a [`StaticRouteTable`].
pub struct RouteTableBuilder {
    filters: FilterRegistry,
    legacy_prefixes: bool,
    routes: Vec<RouteEntry>,
}

impl Default for RouteTableBuilder {
    fn default() -> Self {
        Self {
            filters: FilterRegistry::default(),
            legacy_prefixes: true,
            routes: Vec::new(),
        }
    }
}

impl RouteTableBuilder {
    pub fn filters(mut self, registry: FilterRegistry) -> Self {
        self.filters = registry;
        self
    }

    pub fn legacy_prefixes(mut self, enabled: bool) -> Self {
        self.legacy_prefixes = enabled;
        self
    }

    pub fn route(mut self, entry: RouteEntry) -> Self {
        self.routes.push(entry);
        self
    }

    pub fn build(self) -> StaticRouteTable {
        let mut entries = Vec::new();

        for entry in self.routes {
            let pattern = PathPattern::parse(&entry.pattern);
            let request_type = entry.request_type.unwrap_or_else(|| entry.handler_type.clone());
            let filters = self.filters.filters_for(&request_type, &entry.handler_type);

            let route = Arc::new(RouteDescriptor {
                pattern: pattern.clone(),
                methods: entry.methods,
                request_type,
                handler_type: entry.handler_type,
                handler: entry.handler,
                filters,
            });

            let mut seen = HashSet::new();
            let mut variants = vec![pattern.clone()];
            if self.legacy_prefixes {
                variants.extend(LEGACY_PREFIXES.iter().map(|p| pattern.with_prefix(p)));
            }
            for variant in variants {
                if seen.insert(variant.as_str().to_ascii_lowercase()) {
                    entries.push(Entry {
                        pattern: variant,
                        route: Arc::clone(&route),
                    });
                }
            }

            tracing::debug!(
                pattern = %route.pattern,
                handler = %route.handler_type,
                filters = route.filters.len(),
                "Route registered"
            );
        }

        // Stable: ties keep registration order.
        entries.sort_by_key(|e| std::cmp::Reverse(e.pattern.literal_count()));
        StaticRouteTable { entries }
    }
}
