//! Outbound response model.
//!
//! # Responsibilities
//! - Collect status, headers and body written by the pipeline
//! - Freeze status and headers once the response has started
//! - Convert into a transport response when the dispatch completes
//!
//! # Design Decisions
//! - Mutating status/headers after `flush()` fails with `ResponseStarted`
//! - Body writes keep appending after start (streaming continues)

use axum::body::{Body, Bytes};
use axum::http::header::{CONTENT_TYPE, LOCATION};
use axum::http::{HeaderMap, HeaderName, HeaderValue, Response, StatusCode};

use crate::dispatch::error::ResponseStarted;

pub const TEXT_PLAIN: &str = "text/plain";
pub const TEXT_HTML: &str = "text/html";

/// Response under construction for one dispatch.
#[derive(Debug, Default)]
pub struct OutboundResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
    started: bool,
}

impl OutboundResponse {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok())
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// True once any bytes have been committed to the client.
    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn set_status(&mut self, status: StatusCode) -> Result<(), ResponseStarted> {
        self.ensure_not_started()?;
        self.status = status;
        Ok(())
    }

    pub fn set_content_type(&mut self, content_type: &'static str) -> Result<(), ResponseStarted> {
        self.insert_header(CONTENT_TYPE, HeaderValue::from_static(content_type))
    }

    pub fn insert_header(&mut self, name: HeaderName, value: HeaderValue) -> Result<(), ResponseStarted> {
        self.ensure_not_started()?;
        self.headers.insert(name, value);
        Ok(())
    }

    pub fn remove_header(&mut self, name: &HeaderName) -> Result<(), ResponseStarted> {
        self.ensure_not_started()?;
        self.headers.remove(name);
        Ok(())
    }

    /// Append to the body.
    /// Drop every header except `Access-Control-*`.
    pub fn retain_cors_headers(&mut self) -> Result<(), ResponseStarted> {
        self.ensure_not_started()?;
        self.headers = self
            .headers
            .iter()
            .filter(|(name, _)| name.as_str().starts_with("access-control-"))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();
        Ok(())
    }

    pub fn write(&mut self, data: impl AsRef<[u8]>) {
        self.body.extend_from_slice(data.as_ref());
    }

    /// Drop buffered, uncommitted body bytes.
    pub fn clear_body(&mut self) -> Result<(), ResponseStarted> {
        self.ensure_not_started()?;
        self.body.clear();
        Ok(())
    }

    /// Commit status, headers and the body written so far.
    pub fn flush(&mut self) {
        self.started = true;
    }

    /// Replace the response with a complete body of the given type.
    pub fn respond(
        &mut self,
        status: StatusCode,
        content_type: &'static str,
        body: impl AsRef<[u8]>,
    ) -> Result<(), ResponseStarted> {
        self.set_status(status)?;
        self.set_content_type(content_type)?;
        self.clear_body()?;
        self.write(body);
        Ok(())
    }

    /// 302 to `location`, which may be relative.
    pub fn redirect(&mut self, location: &str) -> Result<(), ResponseStarted> {
        let value = HeaderValue::from_str(location)
            .unwrap_or_else(|_| HeaderValue::from_static("/"));
        self.set_status(StatusCode::FOUND)?;
        self.insert_header(LOCATION, value)?;
        self.clear_body()
    }

    fn ensure_not_started(&self) -> Result<(), ResponseStarted> {
        if self.started {
            Err(ResponseStarted)
        } else {
            Ok(())
        }
    }

    /// Convert into the transport response.
    pub fn into_http(self) -> Response<Body> {
        let mut response = Response::new(Body::from(Bytes::from(self.body)));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}
