//! Handler contract and per-dispatch request context.

use async_trait::async_trait;
use serde_json::Value;

use crate::dispatch::GatewayError;
use crate::http::codec::{Codec, ResponseFormat};
use crate::http::response::OutboundResponse;
use crate::http::InboundRequest;

/// Path parameters captured by a route pattern, in pattern order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams(Vec<(String, String)>);

impl PathParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.push((name.into(), value.into()));
    }

    /// Value captured for `name`, ignoring ASCII case.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Everything a filter or handler may read about the current dispatch.
pub struct RequestContext<'a> {
    pub request: &'a InboundRequest,
    pub params: &'a PathParams,
    pub format: ResponseFormat,
    pub codec: &'a dyn Codec,
}

impl<'a> RequestContext<'a> {
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name)
    }

    /// Decode the request body with the negotiated format.
    pub fn body_value(&self) -> Result<Value, GatewayError> {
        self.codec.deserialize(self.request.body(), self.format)
    }

    /// Encode `value` with the negotiated format and write it as the body.
    pub fn write_value(&self, response: &mut OutboundResponse, value: &Value) -> Result<(), GatewayError> {
        let body = self.codec.serialize(value, self.format)?;
        response.set_content_type(self.format.content_type())?;
        response.write(body);
        Ok(())
    }
}

/// Application logic bound to a route.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn handle(
        &self,
        ctx: &RequestContext<'_>,
        response: &mut OutboundResponse,
    ) -> Result<(), GatewayError>;
}
