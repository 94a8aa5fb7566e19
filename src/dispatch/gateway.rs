//! The per-request pipeline.
//!
//! # Responsibilities
//! - Run admission checks (shutdown, host, remote access, SSL)
//! - Answer CORS preflights and legacy URLs without touching handlers
//! - Resolve the route and invoke filters and handler
//! - Turn every failure into a sanitized HTTP response
//! - Record latency and flag slow requests
//!
//! # Design Decisions
//! - Steps run in a fixed order; each early answer ends the dispatch
//! - `dispatch` never returns an error; the boundary absorbs everything
//! - Handler invocation races the cancellation token

use axum::http::{Method, StatusCode};
use std::fmt;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::config::{GatewayConfig, SharedConfig};
use crate::dispatch::error::{classify, severity, GatewayError, Severity};
use crate::dispatch::sanitize::MessageSanitizer;
use crate::dispatch::state::GatewayState;
use crate::filters::{FilterChain, FilterOutcome, ResponseFilter, StandardHeadersFilter};
use crate::http::codec::{Codec, JsonCodec};
use crate::http::query::remove_query_string_by_key;
use crate::http::response::{OutboundResponse, TEXT_HTML, TEXT_PLAIN};
use crate::http::InboundRequest;
use crate::observability::metrics;
use crate::routing::legacy::{bookmark_notice, LegacyPathRewriter, RewriteOutcome};
use crate::routing::{RequestContext, ResolvedRoute, RouteResolver, RouteTable};
use crate::security::headers::preflight_headers;
use crate::security::{NetworkClassifier, SecurityValidator, SubnetClassifier};

/// Why a request was turned away before routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    ShuttingDown,
    InvalidHost,
    Forbidden,
}

impl Rejection {
    pub fn status(self) -> StatusCode {
        match self {
            Self::ShuttingDown => StatusCode::SERVICE_UNAVAILABLE,
            Self::InvalidHost => StatusCode::BAD_REQUEST,
            Self::Forbidden => StatusCode::FORBIDDEN,
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            Self::ShuttingDown => "Server shutting down",
            Self::InvalidHost => "Invalid host",
            Self::Forbidden => "Forbidden",
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Entry point for every HTTP request.
#[derive(Clone)]
pub struct RequestGateway {
    config: SharedConfig,
    state: Arc<GatewayState>,
    validator: SecurityValidator,
    legacy: LegacyPathRewriter,
    resolver: RouteResolver,
    chain: FilterChain,
    codec: Arc<dyn Codec>,
}

impl RequestGateway {
    /// Gateway with the subnet classifier, the JSON codec and the standard
    /// response headers filter.
    pub fn new(config: SharedConfig, state: Arc<GatewayState>, table: Arc<dyn RouteTable>) -> Self {
        let network: Arc<dyn NetworkClassifier> = Arc::new(SubnetClassifier::new(config.clone()));
        let server_name = config.load().listener.server_name.clone();
        let headers: Arc<dyn ResponseFilter> = Arc::new(StandardHeadersFilter::new(&server_name));

        Self {
            validator: SecurityValidator::new(config.clone(), network),
            legacy: LegacyPathRewriter::new(config.clone()),
            resolver: RouteResolver::new(table),
            chain: FilterChain::new(vec![headers]),
            codec: Arc::new(JsonCodec),
            config,
            state,
        }
    }

    /// Replace the network classifier used by the security checks.
    pub fn with_network(mut self, network: Arc<dyn NetworkClassifier>) -> Self {
        self.validator = SecurityValidator::new(self.config.clone(), network);
        self
    }

    /// Replace the global response filters.
    pub fn with_response_filters(mut self, filters: Vec<Arc<dyn ResponseFilter>>) -> Self {
        self.chain = FilterChain::new(filters);
        self
    }

    pub fn with_codec(mut self, codec: Arc<dyn Codec>) -> Self {
        self.codec = codec;
        self
    }

    pub fn state(&self) -> &Arc<GatewayState> {
        &self.state
    }

    pub fn config(&self) -> &SharedConfig {
        &self.config
    }

    /// Process one request into `response`. Never fails.
    pub async fn dispatch(
        &self,
        request: &InboundRequest,
        response: &mut OutboundResponse,
        cancel: &CancellationToken,
    ) {
        let started = Instant::now();
        let config = self.config.load_full();

        if let Err(err) = self.process(&config, request, response, cancel).await {
            let url = remove_query_string_by_key(request.url().as_str(), "api_key");
            self.handle_error(&config, err, &url, response);
        }

        self.complete(
            &config,
            request.method(),
            response.status(),
            started,
            Completed {
                remote_ip: request.remote_ip(),
                request_id: request.header("x-request-id"),
                url: request.url().as_str(),
            },
        );
    }

    /// Answer a request the transport could not read (bad host, body over
    /// the limit).
    ///
    /// Runs the shutdown check first and then the same error boundary,
    /// metrics and slow-request logging as a dispatched request.
    pub fn reject_unreadable(
        &self,
        method: &Method,
        target: &str,
        remote_ip: IpAddr,
        request_id: Option<&str>,
        err: GatewayError,
    ) -> OutboundResponse {
        let started = Instant::now();
        let config = self.config.load_full();
        let mut response = OutboundResponse::new();

        if self.state.is_shutting_down() {
            let rejection = Rejection::ShuttingDown;
            tracing::warn!(url = %target, "Request rejected, server shutting down");
            if let Err(write_err) = response.respond(rejection.status(), TEXT_PLAIN, rejection.message()) {
                tracing::error!(error = %write_err, "Error writing rejection");
            }
        } else {
            let url = remove_query_string_by_key(target, "api_key");
            self.handle_error(&config, err, &url, &mut response);
        }

        self.complete(
            &config,
            method,
            response.status(),
            started,
            Completed { remote_ip, request_id, url: target },
        );
        response
    }

    /// Record metrics and flag the request when it ran over the threshold.
    fn complete(
        &self,
        config: &GatewayConfig,
        method: &Method,
        status: StatusCode,
        started: Instant,
        done: Completed<'_>,
    ) {
        let elapsed = started.elapsed();
        let status = status.as_u16();
        metrics::record_request(method.as_str(), status, elapsed);

        let elapsed_ms = elapsed.as_millis();
        if elapsed_ms > u128::from(config.logging.slow_request_threshold_ms) {
            metrics::record_slow_request();
            tracing::warn!(
                status,
                request_id = done.request_id.unwrap_or("-"),
                remote_ip = %done.remote_ip,
                elapsed_ms = elapsed_ms as u64,
                url = %remove_query_string_by_key(done.url, "api_key"),
                "Slow HTTP response"
            );
        }
    }

    /// Run the admission checks alone, for WebSocket upgrades.
    pub fn admit_upgrade(&self, request: &InboundRequest) -> Result<(), Rejection> {
        self.admit(request)
    }

    fn admit(&self, request: &InboundRequest) -> Result<(), Rejection> {
        if self.state.is_shutting_down() {
            tracing::warn!(url = %request.url(), "Request rejected, server shutting down");
            return Err(Rejection::ShuttingDown);
        }
        if !self.validator.validate_host(request.host(), request.remote_ip()) {
            tracing::debug!(host = request.host(), remote_ip = %request.remote_ip(), "Invalid host");
            return Err(Rejection::InvalidHost);
        }
        if !self.validator.validate_request(request.remote_ip(), request.is_local()) {
            tracing::debug!(remote_ip = %request.remote_ip(), "Remote access denied");
            return Err(Rejection::Forbidden);
        }
        Ok(())
    }

    async fn process(
        &self,
        config: &GatewayConfig,
        request: &InboundRequest,
        response: &mut OutboundResponse,
        cancel: &CancellationToken,
    ) -> Result<(), GatewayError> {
        if let Err(rejection) = self.admit(request) {
            response.respond(rejection.status(), TEXT_PLAIN, rejection.message())?;
            return Ok(());
        }

        if !self.validator.validate_ssl(request.remote_ip(), request.url().as_str()) {
            let location = self.validator.https_redirect_url(request.url());
            tracing::debug!(location = %location, "Redirecting to HTTPS");
            response.redirect(&location)?;
            return Ok(());
        }

        if request.method() == Method::OPTIONS {
            response.set_status(StatusCode::OK)?;
            for (name, value) in preflight_headers() {
                response.insert_header(name, value)?;
            }
            response.clear_body()?;
            return Ok(());
        }

        match self.legacy.rewrite(request) {
            RewriteOutcome::Continue => {}
            RewriteOutcome::Redirect(location) => {
                response.redirect(&location)?;
                return Ok(());
            }
            RewriteOutcome::Notice(url) => {
                response.respond(StatusCode::OK, TEXT_HTML, bookmark_notice(&url))?;
                return Ok(());
            }
        }

        if let Some(body) = self.state.global_response() {
            if !is_override_exempt(config, request.url().as_str()) {
                response.respond(StatusCode::SERVICE_UNAVAILABLE, TEXT_HTML, body.as_bytes())?;
                return Ok(());
            }
        }

        let resolved = self
            .resolver
            .resolve(request.method(), request.path())
            .ok_or_else(|| {
                GatewayError::NotFound(format!("Unable to find the specified file: {}", request.path()))
            })?;

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(GatewayError::Cancelled),
            result = self.invoke(request, &resolved, response) => result,
        }
    }

    async fn invoke(
        &self,
        request: &InboundRequest,
        resolved: &ResolvedRoute,
        response: &mut OutboundResponse,
    ) -> Result<(), GatewayError> {
        let ctx = RequestContext {
            request,
            params: &resolved.params,
            format: resolved.format,
            codec: self.codec.as_ref(),
        };
        let route = &resolved.route;

        let outcome = self
            .chain
            .run_request_filters(&route.filters, &ctx, response)
            .await?;
        if outcome == FilterOutcome::Halt {
            return Ok(());
        }

        route.handler.handle(&ctx, response).await?;
        self.chain.run_response_filters(request, response).await
    }

    /// Log `err` by severity and, unless the response has started, replace
    /// it with the sanitized error.
    ///
    /// Headers the handler set are dropped except CORS headers, so a failed
    /// handler cannot leak a `Location` or `Content-Disposition` onto the
    /// error page.
    fn handle_error(&self, config: &GatewayConfig, err: GatewayError, url: &str, response: &mut OutboundResponse) {
        let status = classify(&err);
        let cause = err.root_cause();

        match severity(&err) {
            Severity::Unexpected => {
                tracing::error!(error = ?err, status = status.as_u16(), url = %url, "Error processing request")
            }
            Severity::Expected => {
                tracing::error!(error = %cause, status = status.as_u16(), url = %url, "Error processing request")
            }
            Severity::Churn => {
                tracing::debug!(error = %cause, url = %url, "Request aborted by transport")
            }
        }

        if response.is_started() {
            return;
        }

        let sanitizer = MessageSanitizer::new([
            config.paths.installation_path.as_str(),
            config.paths.data_path.as_str(),
        ]);
        let message = sanitizer.sanitize(&cause.to_string());
        let written = response
            .retain_cors_headers()
            .and_then(|()| response.respond(status, TEXT_HTML, message));
        if let Err(write_err) = written {
            tracing::error!(error = %write_err, "Error writing error response");
        }
    }
}

/// Request details for the completion log line.
struct Completed<'a> {
    remote_ip: IpAddr,
    request_id: Option<&'a str>,
    url: &'a str,
}

fn is_override_exempt(config: &GatewayConfig, url: &str) -> bool {
    let url = url.to_ascii_lowercase();
    config
        .routing
        .override_exempt_paths
        .iter()
        .filter(|p| !p.is_empty())
        .any(|p| url.contains(&p.to_ascii_lowercase()))
}
