//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate network ranges, ports and addresses
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::GatewayConfig;
use crate::security::network::parse_subnet;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{field}: invalid socket address '{value}'")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{field}: invalid subnet '{value}'")]
    InvalidSubnet { field: &'static str, value: String },

    #[error("https.public_https_port must be non-zero when HTTPS is required")]
    MissingHttpsPort,

    #[error("routing.default_redirect_path must be a relative path")]
    InvalidRedirectPath,

    #[error("logging.slow_request_threshold_ms must be greater than zero")]
    InvalidSlowThreshold,

    #[error("websocket.paths entry '{0}' must be a literal path below '/'")]
    InvalidWebSocketPath(String),

    #[error("websocket.send_queue_capacity must be greater than zero")]
    InvalidSendQueue,

    #[error("admin.api_key must be set when the control plane is enabled")]
    MissingAdminKey,
}

/// Check a configuration, collecting every problem found.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_address(&mut errors, "listener.bind_address", &config.listener.bind_address);
    if config.observability.metrics_enabled {
        check_address(
            &mut errors,
            "observability.metrics_address",
            &config.observability.metrics_address,
        );
    }
    if config.admin.enabled {
        check_address(&mut errors, "admin.bind_address", &config.admin.bind_address);
        if config.admin.api_key.trim().is_empty() {
            errors.push(ValidationError::MissingAdminKey);
        }
    }

    check_subnets(&mut errors, "network.local_network_subnets", &config.network.local_network_subnets);
    check_subnets(&mut errors, "network.remote_ip_filter", &config.network.remote_ip_filter);

    if config.https.require_https && config.https.public_https_port == 0 {
        errors.push(ValidationError::MissingHttpsPort);
    }

    let redirect = config.routing.default_redirect_path.trim();
    if redirect.is_empty() || redirect.starts_with('/') || redirect.contains("://") {
        errors.push(ValidationError::InvalidRedirectPath);
    }

    if config.logging.slow_request_threshold_ms == 0 {
        errors.push(ValidationError::InvalidSlowThreshold);
    }

    for path in &config.websocket.paths {
        let literal = !path.contains(['{', '}', '*', '?', '#']);
        if !path.starts_with('/') || path.len() < 2 || !literal {
            errors.push(ValidationError::InvalidWebSocketPath(path.clone()));
        }
    }

    if config.websocket.send_queue_capacity == 0 {
        errors.push(ValidationError::InvalidSendQueue);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_address(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
}

fn check_subnets(errors: &mut Vec<ValidationError>, field: &'static str, values: &[String]) {
    for value in values.iter().filter(|v| !v.trim().is_empty()) {
        if parse_subnet(value).is_none() {
            errors.push(ValidationError::InvalidSubnet {
                field,
                value: value.clone(),
            });
        }
    }
}
