//! `/System` endpoints.

use async_trait::async_trait;
use axum::http::StatusCode;
use serde_json::{json, Value};

use crate::config::SharedConfig;
use crate::dispatch::GatewayError;
use crate::http::response::{OutboundResponse, TEXT_PLAIN};
use crate::routing::{Handler, RequestContext};

/// Liveness check. Answers with the server name.
pub struct PingHandler {
    config: SharedConfig,
}

impl PingHandler {
    pub fn new(config: SharedConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Handler for PingHandler {
    async fn handle(&self, _ctx: &RequestContext<'_>, response: &mut OutboundResponse) -> Result<(), GatewayError> {
        let name = self.config.load().listener.server_name.clone();
        response.respond(StatusCode::OK, TEXT_PLAIN, name)?;
        Ok(())
    }
}

/// Unauthenticated discovery information.
pub struct PublicInfoHandler {
    config: SharedConfig,
}

impl PublicInfoHandler {
    pub fn new(config: SharedConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Handler for PublicInfoHandler {
    async fn handle(&self, ctx: &RequestContext<'_>, response: &mut OutboundResponse) -> Result<(), GatewayError> {
        let info = public_info(&self.config, ctx);
        ctx.write_value(response, &info)
    }
}

/// Full server information; guarded by the API key filter.
pub struct SystemInfoHandler {
    config: SharedConfig,
}

impl SystemInfoHandler {
    pub fn new(config: SharedConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Handler for SystemInfoHandler {
    async fn handle(&self, ctx: &RequestContext<'_>, response: &mut OutboundResponse) -> Result<(), GatewayError> {
        let config = self.config.load();
        let mut info = public_info(&self.config, ctx);
        if let Value::Object(fields) = &mut info {
            fields.insert("OperatingSystem".into(), json!(std::env::consts::OS));
            fields.insert("SupportsHttps".into(), json!(config.https.enable_https));
            fields.insert("HttpsPortNumber".into(), json!(config.https.public_https_port));
            fields.insert("WebSocketPaths".into(), json!(config.websocket.paths));
        }
        ctx.write_value(response, &info)
    }
}

fn public_info(config: &SharedConfig, ctx: &RequestContext<'_>) -> Value {
    let config = config.load();
    let url = ctx.request.url();
    let local_address = format!("{}://{}", url.scheme(), ctx.request.host());
    json!({
        "ServerName": config.listener.server_name,
        "Version": env!("CARGO_PKG_VERSION"),
        "LocalAddress": local_address,
    })
}
