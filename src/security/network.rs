//! Network topology classification.
//!
//! # Responsibilities
//! - Decide whether an address is in a private address space
//! - Decide whether an address belongs to the local network
//! - Match addresses against configured subnet / IP lists
//!
//! # Design Decisions
//! - IPv4-mapped IPv6 addresses are classified as their IPv4 form
//! - Unparseable list entries never match

use ipnet::IpNet;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use crate::config::SharedConfig;

/// Classifies remote addresses for the security validator.
pub trait NetworkClassifier: Send + Sync {
    /// RFC 1918, loopback, link-local and IPv6 unique-local ranges.
    fn is_in_private_address_space(&self, ip: IpAddr) -> bool;

    /// Private address space plus configured local subnets.
    fn is_in_local_network(&self, ip: IpAddr) -> bool;

    /// Whether `ip` matches any CIDR range or single address in `subnets`.
    fn is_address_in_subnets(&self, ip: IpAddr, subnets: &[String]) -> bool {
        let ip = canonical(ip);
        subnets
            .iter()
            .filter_map(|s| parse_subnet(s))
            .any(|net| net.contains(&ip))
    }
}

/// Default classifier: fixed private ranges plus `network.local_network_subnets`
/// from the live configuration.
#[derive(Clone)]
pub struct SubnetClassifier {
    config: SharedConfig,
}

impl SubnetClassifier {
    pub fn new(config: SharedConfig) -> Self {
        Self { config }
    }
}

impl NetworkClassifier for SubnetClassifier {
    fn is_in_private_address_space(&self, ip: IpAddr) -> bool {
        match canonical(ip) {
            IpAddr::V4(v4) => is_private_v4(v4),
            IpAddr::V6(v6) => is_private_v6(v6),
        }
    }

    fn is_in_local_network(&self, ip: IpAddr) -> bool {
        if self.is_in_private_address_space(ip) {
            return true;
        }
        let config = self.config.load();
        self.is_address_in_subnets(ip, &config.network.local_network_subnets)
    }
}

/// Parse `10.0.0.0/8`, `fe80::/10` or a bare address (host-length prefix).
pub fn parse_subnet(value: &str) -> Option<IpNet> {
    let value = value.trim();
    if let Ok(net) = value.parse::<IpNet>() {
        return Some(net);
    }
    let addr = canonical(value.parse::<IpAddr>().ok()?);
    let prefix = if addr.is_ipv4() { 32 } else { 128 };
    IpNet::new(addr, prefix).ok()
}

fn canonical(ip: IpAddr) -> IpAddr {
    match ip {
        IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
            Some(v4) => IpAddr::V4(v4),
            None => IpAddr::V6(v6),
        },
        v4 => v4,
    }
}

fn is_private_v4(ip: Ipv4Addr) -> bool {
    ip.is_private() || ip.is_loopback() || ip.is_link_local()
}

fn is_private_v6(ip: Ipv6Addr) -> bool {
    let first = ip.segments()[0];
    ip.is_loopback()
        // fc00::/7 unique local
        || (first & 0xfe00) == 0xfc00
        // fe80::/10 link local
        || (first & 0xffc0) == 0xfe80
}
