//! Adapter between the gateway and the route table.

use axum::http::Method;
use std::sync::Arc;

use crate::http::codec::ResponseFormat;
use crate::routing::handler::PathParams;
use crate::routing::router::{RouteDescriptor, RouteTable};

/// A route chosen for one dispatch.
#[derive(Debug, Clone)]
pub struct ResolvedRoute {
    pub route: Arc<RouteDescriptor>,
    pub params: PathParams,
    pub format: ResponseFormat,
}

/// Sanitizes the request path and asks the route table for a handler.
#[derive(Clone)]
pub struct RouteResolver {
    table: Arc<dyn RouteTable>,
}

impl RouteResolver {
    pub fn new(table: Arc<dyn RouteTable>) -> Self {
        Self { table }
    }

    pub fn resolve(&self, method: &Method, raw_path: &str) -> Option<ResolvedRoute> {
        let (path, format) = sanitize_path(raw_path);
        let matched = self.table.lookup(method, path)?;
        Some(ResolvedRoute {
            route: matched.route,
            params: matched.params,
            format: format.unwrap_or_default(),
        })
    }
}

/// Strip a trailing `.json` / `.xml` from the last segment.
///
/// Returns the path to route on and the format the extension named, if any.
pub fn sanitize_path(raw_path: &str) -> (&str, Option<ResponseFormat>) {
    let last_segment_start = raw_path.rfind('/').map(|i| i + 1).unwrap_or(0);
    if let Some(dot) = raw_path[last_segment_start..].rfind('.') {
        let dot = last_segment_start + dot;
        if let Some(format) = ResponseFormat::from_extension(&raw_path[dot + 1..]) {
            return (&raw_path[..dot], Some(format));
        }
    }
    (raw_path, None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::GatewayError;
    use crate::http::response::OutboundResponse;
    use crate::routing::handler::{Handler, RequestContext};
    use crate::routing::router::{RouteEntry, StaticRouteTable};
    use async_trait::async_trait;

    #[test]
    fn strips_known_extensions_only() {
        assert_eq!(sanitize_path("/Users/Public.json"), ("/Users/Public", Some(ResponseFormat::Json)));
        assert_eq!(sanitize_path("/dlna/description.XML"), ("/dlna/description", Some(ResponseFormat::Xml)));
        assert_eq!(sanitize_path("/Videos/1/stream.mp4"), ("/Videos/1/stream.mp4", None));
        assert_eq!(sanitize_path("/v1.json/Items"), ("/v1.json/Items", None));
        assert_eq!(sanitize_path("/"), ("/", None));
    }

    struct Public;

    #[async_trait]
    impl Handler for Public {
        async fn handle(&self, _ctx: &RequestContext<'_>, _r: &mut OutboundResponse) -> Result<(), GatewayError> {
            Ok(())
        }
    }

    #[test]
    fn resolves_with_negotiated_format() {
        let table = StaticRouteTable::builder()
            .route(RouteEntry::new("/Users/Public", Public))
            .build();
        let resolver = RouteResolver::new(Arc::new(table));

        let resolved = resolver.resolve(&Method::GET, "/Users/Public.xml").unwrap();
        assert_eq!(resolved.format, ResponseFormat::Xml);
        assert_eq!(resolver.resolve(&Method::GET, "/Users/Public").unwrap().format, ResponseFormat::Json);
        assert!(resolver.resolve(&Method::GET, "/Users/Private").is_none());
    }
}
