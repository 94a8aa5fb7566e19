//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request path
//!     → legacy.rs (old prefixes, bookmarks: redirect or notice)
//!     → resolver.rs (strip .json/.xml, negotiate format)
//!     → router.rs (route table lookup by verb + path)
//!     → matcher.rs (segment match, capture parameters)
//!     → Return: ResolvedRoute or None
//!
//! Route Compilation (at startup):
//!     RouteEntry[]
//!     → expand under /emby, /mediabrowser, /emby/emby
//!     → attach sorted request filters
//!     → sort by literal segment count
//!     → Freeze as immutable StaticRouteTable
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - No regex in hot path (segment comparison only)
//! - Deterministic: same input always matches same route
//! - First match wins (ordered by specificity, then registration)

pub mod handler;
pub mod legacy;
pub mod matcher;
pub mod resolver;
pub mod router;

pub use handler::{Handler, PathParams, RequestContext};
pub use legacy::{LegacyPathRewriter, RewriteOutcome};
pub use resolver::{ResolvedRoute, RouteResolver};
pub use router::{RouteDescriptor, RouteMatch, RouteEntry, RouteTable, RouteTableBuilder, StaticRouteTable};
