//! Client address extraction from request metadata
//!
//! The leftmost `X-Forwarded-For` entry is taken as the client address. That
//! entry is supplied by whoever opened the connection to the first proxy and
//! can be spoofed; it is only ever used to derive a country label.

use axum::http::HeaderMap;
use std::net::SocketAddr;

pub const FORWARDED_FOR: &str = "x-forwarded-for";

/// Extract the client address from a forwarded-for value and the direct peer.
///
/// Returns an empty string when neither source yields an address.
pub fn extract_client_ip(forwarded_for: Option<&str>, peer: Option<SocketAddr>) -> String {
    if let Some(first) = forwarded_for
        .filter(|value| !value.trim().is_empty())
        .and_then(|value| value.split(',').next())
    {
        return first.trim().to_string();
    }

    peer.map(|addr| addr.ip().to_string()).unwrap_or_default()
}

/// Extract the client address from HTTP headers, falling back to the peer.
///
/// Repeated `X-Forwarded-For` headers are treated as one comma-separated list
/// in the order they were received.
pub fn extract_client_ip_from_headers(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    let forwarded_for = headers
        .get_all(FORWARDED_FOR)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .collect::<Vec<_>>()
        .join(",");

    extract_client_ip(Some(forwarded_for.as_str()), peer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn peer() -> Option<SocketAddr> {
        Some("192.168.1.1:51234".parse().unwrap())
    }

    #[test]
    fn test_leftmost_forwarded_entry_wins() {
        let ip = extract_client_ip(Some("203.0.113.1, 198.51.100.1"), peer());
        assert_eq!(ip, "203.0.113.1");
    }

    #[test]
    fn test_forwarded_entry_is_trimmed() {
        let ip = extract_client_ip(Some("   203.0.113.7   ,10.0.0.1"), peer());
        assert_eq!(ip, "203.0.113.7");
    }

    #[test]
    fn test_blank_forwarded_falls_back_to_peer() {
        assert_eq!(extract_client_ip(Some(""), peer()), "192.168.1.1");
        assert_eq!(extract_client_ip(Some("  "), peer()), "192.168.1.1");
        assert_eq!(extract_client_ip(None, peer()), "192.168.1.1");
    }

    #[test]
    fn test_no_sources_yields_empty_string() {
        assert_eq!(extract_client_ip(None, None), "");
    }

    #[test]
    fn test_ipv6_peer() {
        let peer: SocketAddr = "[2001:db8::1]:443".parse().unwrap();
        assert_eq!(extract_client_ip(None, Some(peer)), "2001:db8::1");
    }

    #[test]
    fn test_headers_with_multiple_forwarded_values() {
        let mut headers = HeaderMap::new();
        headers.append(FORWARDED_FOR, HeaderValue::from_static("203.0.113.1"));
        headers.append(FORWARDED_FOR, HeaderValue::from_static("198.51.100.1"));

        assert_eq!(extract_client_ip_from_headers(&headers, peer()), "203.0.113.1");
    }

    #[test]
    fn test_headers_without_forwarded_for() {
        let headers = HeaderMap::new();
        assert_eq!(extract_client_ip_from_headers(&headers, peer()), "192.168.1.1");
        assert_eq!(extract_client_ip_from_headers(&headers, None), "");
    }
}
