//! Per-request host, network and SSL policy checks.
//!
//! # Responsibilities
//! - Reject privately-originated requests carrying an unexpected Host header
//! - Apply the remote access policy and IP allow/deny list
//! - Decide when a cleartext request must be redirected to HTTPS
//!
//! # Design Decisions
//! - Checks are stateless and read the live configuration on every call
//! - Failures are plain booleans; the gateway turns them into responses

use std::net::IpAddr;
use std::sync::Arc;
use url::Url;

use crate::config::SharedConfig;
use crate::security::network::NetworkClassifier;

/// Host, remote access and SSL checks for inbound requests.
#[derive(Clone)]
pub struct SecurityValidator {
    config: SharedConfig,
    network: Arc<dyn NetworkClassifier>,
}

impl SecurityValidator {
    pub fn new(config: SharedConfig, network: Arc<dyn NetworkClassifier>) -> Self {
        Self { config, network }
    }

    /// Whether `host` is an acceptable Host header for a caller at `remote_ip`.
    pub fn validate_host(&self, host: &str, remote_ip: IpAddr) -> bool {
        let config = self.config.load();
        let mut allowed: Vec<String> = config
            .network
            .local_network_addresses
            .iter()
            .map(|a| normalize_configured_address(a))
            .filter(|a| !a.is_empty())
            .collect();

        if allowed.is_empty() {
            return true;
        }
        if !self.network.is_in_private_address_space(remote_ip) {
            return true;
        }

        allowed.push("localhost".to_string());
        allowed.push("127.0.0.1".to_string());

        let host = host.to_ascii_lowercase();
        allowed
            .iter()
            .any(|name| host.contains(&name.to_ascii_lowercase()))
    }

    /// Whether a caller at `remote_ip` may use the server at all.
    pub fn validate_request(&self, remote_ip: IpAddr, is_local: bool) -> bool {
        if is_local {
            return true;
        }

        let config = self.config.load();
        let network = &config.network;

        if network.enable_remote_access {
            let filter: Vec<String> = network
                .remote_ip_filter
                .iter()
                .filter(|entry| !entry.trim().is_empty())
                .cloned()
                .collect();

            if !filter.is_empty() && !self.network.is_in_local_network(remote_ip) {
                let matched = self.network.is_address_in_subnets(remote_ip, &filter);
                return if network.remote_ip_filter_is_blacklist {
                    !matched
                } else {
                    matched
                };
            }
            true
        } else {
            self.network.is_in_local_network(remote_ip)
        }
    }

    /// Returns false when the request must be redirected to HTTPS.
    pub fn validate_ssl(&self, remote_ip: IpAddr, url: &str) -> bool {
        let config = self.config.load();
        let https = &config.https;

        if !(https.require_https && https.enable_https && !https.behind_reverse_proxy) {
            return true;
        }

        let lower = url.to_ascii_lowercase();
        if lower.contains("https://") {
            return true;
        }

        let exempt = config
            .routing
            .ssl_exempt_paths
            .iter()
            .filter(|p| !p.is_empty())
            .any(|p| lower.contains(&p.to_ascii_lowercase()));
        if exempt {
            return true;
        }

        self.network.is_in_local_network(remote_ip)
    }

    /// The same URL with the scheme upgraded and the public HTTPS port applied.
    pub fn https_redirect_url(&self, url: &Url) -> String {
        let port = self.config.load().https.public_https_port;
        let mut upgraded = url.clone();
        // Both calls only fail for cannot-be-a-base URLs, which never reach here.
        let _ = upgraded.set_scheme("https");
        let _ = upgraded.set_port(Some(port));
        upgraded.to_string()
    }
}

/// Strip a leading scheme or slash segment and surrounding slashes:
/// `http://192.168.1.5/` becomes `192.168.1.5`.
fn normalize_configured_address(address: &str) -> String {
    let trimmed = address.trim().trim_matches('/');
    let rest = match trimmed.find('/') {
        Some(index) => &trimmed[index + 1..],
        None => trimmed,
    };
    rest.trim_matches('/').to_string()
}
