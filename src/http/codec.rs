//! Serialization seam between handlers and the wire.
//!
//! The gateway only forwards to a codec; it never encodes bodies itself.

use serde_json::Value;

use crate::dispatch::GatewayError;

/// Response format negotiated from the request path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseFormat {
    #[default]
    Json,
    Xml,
}

impl ResponseFormat {
    /// Format named by a path extension such as `json` or `XML`.
    pub fn from_extension(ext: &str) -> Option<Self> {
        if ext.eq_ignore_ascii_case("json") {
            Some(Self::Json)
        } else if ext.eq_ignore_ascii_case("xml") {
            Some(Self::Xml)
        } else {
            None
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::Xml => "application/xml",
        }
    }
}

/// Encodes and decodes request/response bodies.
pub trait Codec: Send + Sync {
    fn serialize(&self, value: &Value, format: ResponseFormat) -> Result<Vec<u8>, GatewayError>;

    fn deserialize(&self, body: &[u8], format: ResponseFormat) -> Result<Value, GatewayError>;
}

/// JSON-only codec.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn serialize(&self, value: &Value, format: ResponseFormat) -> Result<Vec<u8>, GatewayError> {
        match format {
            ResponseFormat::Json => serde_json::to_vec(value).map_err(GatewayError::unexpected),
            ResponseFormat::Xml => Err(unsupported(format)),
        }
    }

    fn deserialize(&self, body: &[u8], format: ResponseFormat) -> Result<Value, GatewayError> {
        match format {
            ResponseFormat::Json => serde_json::from_slice(body)
                .map_err(|e| GatewayError::InvalidArgument(format!("Invalid request body: {e}"))),
            ResponseFormat::Xml => Err(unsupported(format)),
        }
    }
}

fn unsupported(format: ResponseFormat) -> GatewayError {
    GatewayError::InvalidArgument(format!("{} is not supported", format.content_type()))
}
