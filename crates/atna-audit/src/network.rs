//! Network access point classification.
//!
//! Purely lexical: a host token is an IP address if it parses as an IPv4
//! dotted quad or an IPv6 literal, otherwise it is a machine name. No name
//! resolution is ever attempted.

use serde::{Deserialize, Serialize};
use std::net::IpAddr;

/// Kind of a participant's network access point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NetworkAccessPointKind {
    #[serde(rename = "1")]
    MachineName,
    #[serde(rename = "2")]
    IpAddress,
}

impl std::fmt::Display for NetworkAccessPointKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MachineName => write!(f, "MACHINE_NAME"),
            Self::IpAddress => write!(f, "IP_ADDRESS"),
        }
    }
}

/// Classify a host token. `None` and empty tokens are machine names.
pub fn classify_host(host: Option<&str>) -> NetworkAccessPointKind {
    match host {
        Some(host) if is_ip_literal(host) => NetworkAccessPointKind::IpAddress,
        _ => NetworkAccessPointKind::MachineName,
    }
}

fn is_ip_literal(host: &str) -> bool {
    // [::1] as found in URIs
    let literal = host
        .strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(host);

    // fe80::1%eth0: the zone index is not part of the address
    let literal = match literal.split_once('%') {
        Some((addr, _zone)) if addr.contains(':') => addr,
        _ => literal,
    };

    literal.parse::<IpAddr>().is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ipv4() {
        assert_eq!(classify_host(Some("192.168.1.5")), NetworkAccessPointKind::IpAddress);
        assert_eq!(classify_host(Some("10.0.0.9")), NetworkAccessPointKind::IpAddress);
    }

    #[test]
    fn test_ipv6() {
        assert_eq!(classify_host(Some("::1")), NetworkAccessPointKind::IpAddress);
        assert_eq!(classify_host(Some("[::1]")), NetworkAccessPointKind::IpAddress);
        assert_eq!(
            classify_host(Some("2001:db8::8a2e:370:7334")),
            NetworkAccessPointKind::IpAddress
        );
        assert_eq!(classify_host(Some("fe80::1%eth0")), NetworkAccessPointKind::IpAddress);
    }

    #[test]
    fn test_machine_names() {
        assert_eq!(
            classify_host(Some("archive-host.local")),
            NetworkAccessPointKind::MachineName
        );
        assert_eq!(classify_host(Some("localhost")), NetworkAccessPointKind::MachineName);
        assert_eq!(classify_host(Some("999.1.1.1")), NetworkAccessPointKind::MachineName);
        assert_eq!(classify_host(Some("10.0.0")), NetworkAccessPointKind::MachineName);
        assert_eq!(classify_host(Some("host%eth0")), NetworkAccessPointKind::MachineName);
    }

    #[test]
    fn test_null_and_empty() {
        assert_eq!(classify_host(None), NetworkAccessPointKind::MachineName);
        assert_eq!(classify_host(Some("")), NetworkAccessPointKind::MachineName);
    }
}
