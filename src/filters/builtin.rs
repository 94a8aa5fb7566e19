//! Filters shipped with the gateway.

use async_trait::async_trait;
use axum::http::header::{ACCESS_CONTROL_ALLOW_ORIGIN, SERVER};
use axum::http::HeaderValue;
use subtle::{Choice, ConstantTimeEq};

use crate::config::SharedConfig;
use crate::dispatch::GatewayError;
use crate::filters::{FilterOutcome, RequestFilter, ResponseFilter};
use crate::http::response::OutboundResponse;
use crate::http::InboundRequest;
use crate::routing::handler::RequestContext;
use crate::security::headers::{AUTHORIZATION_HEADER, EMBY_TOKEN_HEADER, TOKEN_HEADER};

/// Priority for authentication filters; runs before business filters.
pub const AUTH_PRIORITY: i32 = -1;

/// Requires one of `security.api_keys`. No configured keys disables the check.
pub struct ApiKeyFilter {
    config: SharedConfig,
}

impl ApiKeyFilter {
    pub fn new(config: SharedConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl RequestFilter for ApiKeyFilter {
    async fn apply(
        &self,
        ctx: &RequestContext<'_>,
        _response: &mut OutboundResponse,
    ) -> Result<FilterOutcome, GatewayError> {
        let config = self.config.load();
        let keys = &config.security.api_keys;
        if keys.is_empty() {
            return Ok(FilterOutcome::Continue);
        }

        match request_token(ctx.request) {
            Some(token) if matches_any(keys, &token) => Ok(FilterOutcome::Continue),
            Some(_) => Err(GatewayError::Unauthorized(
                "Access token is invalid or expired.".to_string(),
            )),
            None => Err(GatewayError::Unauthorized("Access token is required.".to_string())),
        }
    }
}

/// Compare secrets without an early exit on the first differing byte.
/// Only the lengths can leak.
pub(crate) fn secrets_match(expected: &str, presented: &str) -> bool {
    expected.as_bytes().ct_eq(presented.as_bytes()).into()
}

/// Every key is compared, so timing does not reveal which one matched.
fn matches_any(keys: &[String], token: &str) -> bool {
    keys.iter()
        .fold(Choice::from(0), |found, key| found | key.as_bytes().ct_eq(token.as_bytes()))
        .into()
}

/// Token from the token headers, the authorization header's `Token` field,
/// or the `api_key` query parameter.
pub fn request_token(request: &InboundRequest) -> Option<String> {
    for name in [EMBY_TOKEN_HEADER, TOKEN_HEADER] {
        if let Some(token) = request.header(name).filter(|t| !t.is_empty()) {
            return Some(token.to_string());
        }
    }
    if let Some(token) = request.header(AUTHORIZATION_HEADER).and_then(authorization_token) {
        return Some(token);
    }
    request
        .query("api_key")
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

/// Extract `Token="..."` from `MediaBrowser Client="x", Token="abc"`.
fn authorization_token(header: &str) -> Option<String> {
    let params = header.split_once(' ').map(|(_, rest)| rest).unwrap_or(header);
    params.split(',').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        if name.trim().eq_ignore_ascii_case("token") {
            let value = value.trim().trim_matches('"');
            (!value.is_empty()).then(|| value.to_string())
        } else {
            None
        }
    })
}

/// Adds headers every response carries.
pub struct StandardHeadersFilter {
    server: HeaderValue,
}

impl StandardHeadersFilter {
    pub fn new(server_name: &str) -> Self {
        let server = HeaderValue::from_str(server_name)
            .unwrap_or_else(|_| HeaderValue::from_static("media-gateway"));
        Self { server }
    }
}

#[async_trait]
impl ResponseFilter for StandardHeadersFilter {
    async fn apply(
        &self,
        _request: &InboundRequest,
        response: &mut OutboundResponse,
    ) -> Result<(), GatewayError> {
        if response.is_started() {
            return Ok(());
        }
        if !response.headers().contains_key(ACCESS_CONTROL_ALLOW_ORIGIN) {
            response.insert_header(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"))?;
        }
        response.insert_header(SERVER, self.server.clone())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{shared, GatewayConfig};
    use crate::http::codec::{JsonCodec, ResponseFormat};
    use crate::routing::handler::PathParams;
    use axum::http::{HeaderName, Method};

    fn request(url: &str) -> InboundRequest {
        InboundRequest::new(Method::GET, url, "192.168.1.2".parse().unwrap()).unwrap()
    }

    async fn check(filter: &ApiKeyFilter, request: &InboundRequest) -> Result<FilterOutcome, GatewayError> {
        let params = PathParams::new();
        let ctx = RequestContext {
            request,
            params: &params,
            format: ResponseFormat::Json,
            codec: &JsonCodec,
        };
        filter.apply(&ctx, &mut OutboundResponse::new()).await
    }

    #[test]
    fn parses_authorization_header() {
        assert_eq!(
            authorization_token(r#"MediaBrowser Client="Web", Device="x", Token="abc123""#),
            Some("abc123".to_string())
        );
        assert_eq!(authorization_token(r#"MediaBrowser Client="Web""#), None);
    }

    #[test]
    fn secret_comparison() {
        assert!(secrets_match("secret", "secret"));
        assert!(!secrets_match("secret", "secreT"));
        assert!(!secrets_match("secret", "secret2"));
        assert!(!secrets_match("secret", ""));
    }

    #[test]
    fn any_configured_key_matches() {
        let keys = vec!["first".to_string(), "second".to_string()];
        assert!(matches_any(&keys, "second"));
        assert!(matches_any(&keys, "first"));
        assert!(!matches_any(&keys, "sec"));
        assert!(!matches_any(&[], "first"));
    }

    #[tokio::test]
    async fn api_key_filter() {
        let mut config = GatewayConfig::default();
        config.security.api_keys = vec!["secret".into()];
        let filter = ApiKeyFilter::new(shared(config));

        assert!(matches!(check(&filter, &request("http://h/Items?api_key=secret")).await, Ok(FilterOutcome::Continue)));
        let with_header = request("http://h/Items").with_header(
            HeaderName::from_static("x-emby-token"),
            HeaderValue::from_static("secret"),
        );
        assert!(check(&filter, &with_header).await.is_ok());
        assert!(matches!(check(&filter, &request("http://h/Items?api_key=nope")).await, Err(GatewayError::Unauthorized(_))));
        assert!(matches!(check(&filter, &request("http://h/Items")).await, Err(GatewayError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn api_key_filter_disabled_without_keys() {
        let filter = ApiKeyFilter::new(shared(GatewayConfig::default()));
        assert!(matches!(check(&filter, &request("http://h/Items")).await, Ok(FilterOutcome::Continue)));
    }

    #[tokio::test]
    async fn standard_headers_skip_started_responses() {
        let filter = StandardHeadersFilter::new("Media Server");
        let req = request("http://h/");

        let mut fresh = OutboundResponse::new();
        filter.apply(&req, &mut fresh).await.unwrap();
        assert_eq!(fresh.headers().get(SERVER).unwrap(), "Media Server");

        let mut started = OutboundResponse::new();
        started.flush();
        filter.apply(&req, &mut started).await.unwrap();
        assert!(started.headers().get(SERVER).is_none());
    }
}
