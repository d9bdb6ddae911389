//! Subnet comparison of client addresses

use std::net::IpAddr;

use ipnetwork::{Ipv4Network, Ipv6Network};

/// Whether two addresses fall in the same subnet
///
/// Addresses of different families never match. When either side does not
/// parse, or the prefix length is out of range, the raw strings are compared.
pub fn same_network(a: &str, b: &str, ipv4_prefix: u8, ipv6_prefix: u8) -> bool {
    let (a, b) = (a.trim(), b.trim());
    let (left, right) = match (a.parse::<IpAddr>(), b.parse::<IpAddr>()) {
        (Ok(left), Ok(right)) => (left, right),
        _ => return a == b,
    };

    match (left, right) {
        (IpAddr::V4(left), IpAddr::V4(right)) => Ipv4Network::new(left, ipv4_prefix)
            .map(|net| net.contains(right))
            .unwrap_or(left == right),
        (IpAddr::V6(left), IpAddr::V6(right)) => Ipv6Network::new(left, ipv6_prefix)
            .map(|net| net.contains(right))
            .unwrap_or(left == right),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ipv4_same_slash_24() {
        assert!(same_network("192.168.1.10", "192.168.1.200", 24, 48));
        assert!(!same_network("192.168.1.10", "192.168.2.10", 24, 48));
        assert!(same_network("192.168.1.10", "192.168.2.10", 16, 48));
    }

    #[test]
    fn test_ipv6_same_slash_48() {
        assert!(same_network("2001:db8:abcd:1::1", "2001:db8:abcd:ffff::2", 24, 48));
        assert!(!same_network("2001:db8:abcd::1", "2001:db8:abce::1", 24, 48));
    }

    #[test]
    fn test_mixed_families_differ() {
        assert!(!same_network("10.0.0.1", "::1", 24, 48));
    }

    #[test]
    fn test_unparsable_compares_literally() {
        assert!(same_network("unknown", "unknown", 24, 48));
        assert!(!same_network("unknown", "10.0.0.1", 24, 48));
    }

    #[test]
    fn test_invalid_prefix_compares_exactly() {
        assert!(same_network("10.0.0.1", "10.0.0.1", 40, 48));
        assert!(!same_network("10.0.0.1", "10.0.0.2", 40, 48));
    }
}
