//! Inbound request model.
//!
//! # Responsibilities
//! - Capture verb, absolute URL, query, caller address and body once
//! - Read the body with the configured size limit
//! - Resolve the caller address (optionally from X-Forwarded-For)
//!
//! # Design Decisions
//! - Immutable for the duration of one dispatch
//! - Body is buffered so filters and handlers can both read it

use axum::body::{Body, Bytes};
use axum::http::header::HOST;
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, Request};
use std::net::{IpAddr, SocketAddr};
use url::Url;

use crate::dispatch::GatewayError;

pub const X_FORWARDED_FOR: &str = "x-forwarded-for";
pub const X_FORWARDED_PROTO: &str = "x-forwarded-proto";

/// One inbound HTTP request as seen by the gateway.
#[derive(Debug, Clone)]
pub struct InboundRequest {
    method: Method,
    url: Url,
    query: Vec<(String, String)>,
    remote_ip: IpAddr,
    is_local: bool,
    headers: HeaderMap,
    body: Bytes,
}

impl InboundRequest {
    /// Build a request from an absolute URL. Loopback callers are local.
    pub fn new(method: Method, url: &str, remote_ip: IpAddr) -> Result<Self, GatewayError> {
        let url = Url::parse(url)
            .map_err(|e| GatewayError::InvalidArgument(format!("Invalid request URL: {e}")))?;
        let query = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        let mut headers = HeaderMap::new();
        if let Some(host) = url.host_str() {
            let host = match url.port() {
                Some(port) => format!("{host}:{port}"),
                None => host.to_string(),
            };
            if let Ok(value) = HeaderValue::from_str(&host) {
                headers.insert(HOST, value);
            }
        }

        Ok(Self {
            method,
            url,
            query,
            remote_ip,
            is_local: remote_ip.is_loopback(),
            headers,
            body: Bytes::new(),
        })
    }

    /// Convert a transport request, reading at most `max_body` bytes.
    pub async fn from_http(
        request: Request<Body>,
        remote: SocketAddr,
        max_body: usize,
        behind_proxy: bool,
    ) -> Result<Self, GatewayError> {
        let (parts, body) = request.into_parts();

        let host = parts
            .headers
            .get(HOST)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .or_else(|| parts.uri.authority().map(|a| a.to_string()))
            .unwrap_or_else(|| "localhost".to_string());

        let forwarded_https = behind_proxy
            && parts
                .headers
                .get(X_FORWARDED_PROTO)
                .and_then(|v| v.to_str().ok())
                .map(|v| v.eq_ignore_ascii_case("https"))
                .unwrap_or(false);
        let scheme = if forwarded_https { "https" } else { "http" };

        let mut url = authority_url(scheme, &host)?;
        url.set_path(parts.uri.path());
        url.set_query(parts.uri.query());

        let remote_ip = if behind_proxy {
            forwarded_client(&parts.headers).unwrap_or_else(|| remote.ip())
        } else {
            remote.ip()
        };

        let mut request = Self::new(parts.method, url.as_str(), remote_ip)?;
        request.headers = parts.headers;
        request.body = axum::body::to_bytes(body, max_body)
            .await
            .map_err(|e| GatewayError::InvalidArgument(format!("Unable to read request body: {e}")))?;

        Ok(request)
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Override the locality flag (e.g. for a caller on the server's own address).
    pub fn with_local(mut self, is_local: bool) -> Self {
        self.is_local = is_local;
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn path(&self) -> &str {
        self.url.path()
    }

    pub fn query_params(&self) -> &[(String, String)] {
        &self.query
    }

    /// First query value whose name matches `key`, ignoring ASCII case.
    pub fn query(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    pub fn remote_ip(&self) -> IpAddr {
        self.remote_ip
    }

    pub fn is_local(&self) -> bool {
        self.is_local
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Host header as sent, falling back to the URL authority.
    pub fn host(&self) -> &str {
        self.header(HOST.as_str())
            .or_else(|| self.url.host_str())
            .unwrap_or("")
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }
}

/// `scheme://host/` for a Host value that names only a host and port.
///
/// Anything the URL parser would read as path, query, fragment or
/// credentials is refused, so the request target alone decides the path.
fn authority_url(scheme: &str, host: &str) -> Result<Url, GatewayError> {
    let invalid = || GatewayError::InvalidArgument("Invalid host".to_string());
    let url = Url::parse(&format!("{scheme}://{host}/")).map_err(|_| invalid())?;
    let authority_only = url.host_str().is_some()
        && url.path() == "/"
        && url.query().is_none()
        && url.fragment().is_none()
        && url.username().is_empty()
        && url.password().is_none();
    if authority_only {
        Ok(url)
    } else {
        Err(invalid())
    }
}

fn forwarded_client(headers: &HeaderMap) -> Option<IpAddr> {
    headers
        .get(X_FORWARDED_FOR)?
        .to_str()
        .ok()?
        .split(',')
        .next()?
        .trim()
        .parse()
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_query_and_host() {
        let req = InboundRequest::new(
            Method::GET,
            "http://media.lan:8096/Items?Fields=Path&API_KEY=abc",
            "192.168.1.4".parse().unwrap(),
        )
        .unwrap();
        assert_eq!(req.path(), "/Items");
        assert_eq!(req.query("api_key"), Some("abc"));
        assert_eq!(req.host(), "media.lan:8096");
        assert!(!req.is_local());
    }

    #[test]
    fn loopback_is_local() {
        let req = InboundRequest::new(Method::GET, "http://localhost/", "127.0.0.1".parse().unwrap()).unwrap();
        assert!(req.is_local());
    }

    #[tokio::test]
    async fn from_http_uses_forwarded_headers_behind_proxy() {
        let request = Request::builder()
            .uri("/web/index.html?x=1")
            .header("host", "media.example")
            .header(X_FORWARDED_FOR, "203.0.113.7, 10.0.0.2")
            .header(X_FORWARDED_PROTO, "https")
            .body(Body::from("payload"))
            .unwrap();
        let remote: SocketAddr = "10.0.0.2:50000".parse().unwrap();

        let req = InboundRequest::from_http(request, remote, 1024, true).await.unwrap();
        assert_eq!(req.url().as_str(), "https://media.example/web/index.html?x=1");
        assert_eq!(req.remote_ip(), "203.0.113.7".parse::<IpAddr>().unwrap());
        assert_eq!(req.body().as_ref(), b"payload");
    }

    #[tokio::test]
    async fn from_http_ignores_forwarded_headers_by_default() {
        let request = Request::builder()
            .uri("/")
            .header("host", "media.example")
            .header(X_FORWARDED_FOR, "203.0.113.7")
            .header(X_FORWARDED_PROTO, "https")
            .body(Body::empty())
            .unwrap();
        let remote: SocketAddr = "127.0.0.1:50000".parse().unwrap();

        let req = InboundRequest::from_http(request, remote, 1024, false).await.unwrap();
        assert_eq!(req.url().scheme(), "http");
        assert!(req.is_local());
    }

    async fn from_host(host: &str, uri: &str) -> Result<InboundRequest, GatewayError> {
        let request = Request::builder()
            .uri(uri)
            .header("host", host)
            .body(Body::empty())
            .unwrap();
        InboundRequest::from_http(request, "192.168.1.4:50000".parse().unwrap(), 1024, false).await
    }

    #[tokio::test]
    async fn host_header_cannot_add_path_segments() {
        let err = from_host("media.lan/System", "/Ping").await.unwrap_err();
        assert!(matches!(err, GatewayError::InvalidArgument(ref m) if m == "Invalid host"));
    }

    #[tokio::test]
    async fn host_header_cannot_hide_the_target_in_a_fragment() {
        let err = from_host("media.lan#", "/System/Info?api_key=x").await.unwrap_err();
        assert!(matches!(err, GatewayError::InvalidArgument(_)));

        for host in ["media.lan?x=1", "user@media.lan", "user:pw@media.lan"] {
            assert!(from_host(host, "/").await.is_err(), "{host}");
        }
    }

    #[tokio::test]
    async fn target_decides_path_and_query() {
        let req = from_host("Media.LAN:8096", "/System/Info?api_key=x").await.unwrap();
        assert_eq!(req.url().as_str(), "http://media.lan:8096/System/Info?api_key=x");
        assert_eq!(req.path(), "/System/Info");
        assert_eq!(req.query("api_key"), Some("x"));
        assert_eq!(req.host(), "Media.LAN:8096");
    }

    #[tokio::test]
    async fn oversized_body_is_invalid_argument() {
        let request = Request::builder()
            .uri("/Items")
            .header("host", "media.example")
            .body(Body::from(vec![0u8; 64]))
            .unwrap();
        let remote: SocketAddr = "127.0.0.1:1".parse().unwrap();
        let err = InboundRequest::from_http(request, remote, 16, false).await.unwrap_err();
        assert!(matches!(err, GatewayError::InvalidArgument(_)));
    }
}
