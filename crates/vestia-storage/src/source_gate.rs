//! Source URL validation for the storage relay.
//!
//! The relay downloads from URLs handed back by the remote processing
//! service. Before any network activity the URL must pass this gate:
//! secure transport, a host on the configured allow-list, and no literal
//! private or internal addresses. This keeps a compromised or misbehaving
//! response body from steering the relay at internal infrastructure.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// Validate a download source URL against the host allow-list.
///
/// `allow_loopback` relaxes the scheme and private-address checks for
/// loopback hosts only. It exists for local development and tests; the
/// production pipeline always passes `false`.
pub fn validate_source_url(
    url: &str,
    allowed_hosts: &[String],
    allow_loopback: bool,
) -> Result<(), String> {
    let parsed = reqwest::Url::parse(url).map_err(|e| format!("Invalid URL: {e}"))?;

    let host = parsed
        .host_str()
        .ok_or_else(|| "URL must have a host".to_string())?
        .to_ascii_lowercase();

    let literal_ip: Option<IpAddr> = host.parse().ok();
    let is_loopback_host = host == "localhost"
        || literal_ip.map(|ip| ip.is_loopback()).unwrap_or(false);

    match parsed.scheme() {
        "https" => {}
        "http" if allow_loopback && is_loopback_host => {}
        other => return Err(format!("Scheme '{other}' is not allowed, use https")),
    }

    if !allow_loopback && (is_loopback_host || host.ends_with(".local")) {
        return Err(format!("Host '{host}' resolves to internal infrastructure"));
    }

    if let Some(ip) = literal_ip {
        if is_private_ip(&ip) && !(allow_loopback && ip.is_loopback()) {
            return Err("Private or internal IP addresses are not allowed".to_string());
        }
    }

    let allowed = allowed_hosts.iter().any(|entry| {
        let entry = entry.to_ascii_lowercase();
        host == entry || host.ends_with(&format!(".{entry}"))
    });
    if !allowed {
        return Err(format!("Host '{host}' is not on the source allow-list"));
    }

    Ok(())
}

fn is_private_ip(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => is_private_ipv4(v4),
        IpAddr::V6(v6) => is_private_ipv6(v6),
    }
}

fn is_private_ipv4(ip: &Ipv4Addr) -> bool {
    ip.is_private()
        || ip.is_loopback()
        || ip.is_link_local()
        || ip.is_broadcast()
        || ip.is_documentation()
        || ip.is_unspecified()
        // Carrier-grade NAT range 100.64.0.0/10.
        || (ip.octets()[0] == 100 && (ip.octets()[1] & 0xc0) == 64)
}

fn is_private_ipv6(ip: &Ipv6Addr) -> bool {
    if let Some(v4) = ip.to_ipv4_mapped() {
        return is_private_ipv4(&v4);
    }
    ip.is_loopback()
        || ip.is_unspecified()
        // Unique-local fc00::/7 and link-local fe80::/10.
        || (ip.segments()[0] & 0xfe00) == 0xfc00
        || (ip.segments()[0] & 0xffc0) == 0xfe80
}
