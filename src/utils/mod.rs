use ipnetwork::{IpNetwork, Ipv4Network, Ipv6Network};
use std::net::{Ipv4Addr, Ipv6Addr};

use crate::error::ProvisionError;

/// Lowercase a name and collapse every run of non-alphanumerics into one hyphen
pub fn slugify(s: &str) -> String {
    s.to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '-' })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// Validate a VLAN name: lowercase ASCII letters and hyphens, 1..=max_len chars.
pub fn is_valid_vlan_name(name: &str, max_len: usize) -> bool {
    if name.is_empty() || name.len() > max_len {
        return false;
    }
    name.chars().all(|c| c.is_ascii_lowercase() || c == '-')
}

/// Reduce a network to its base address, keeping the prefix length
/// (e.g. "10.0.0.7/24" -> "10.0.0.0/24").
pub fn canonical_network(net: IpNetwork) -> IpNetwork {
    match net {
        IpNetwork::V4(n) => IpNetwork::V4(
            Ipv4Network::new(n.network(), n.prefix()).unwrap_or(n),
        ),
        IpNetwork::V6(n) => IpNetwork::V6(
            Ipv6Network::new(n.network(), n.prefix()).unwrap_or(n),
        ),
    }
}

/// Address `offset` above the base of `net`, carrying the network's prefix
/// length. Fails when the result would fall outside the network.
pub fn host_at(net: IpNetwork, offset: u128) -> Result<IpNetwork, ProvisionError> {
    let exhausted = || {
        ProvisionError::invalid(
            "ip address",
            format!("offset {} is outside {} (address space exhausted)", offset, net),
        )
    };

    match net {
        IpNetwork::V4(n) => {
            let base = u32::from(n.network()) as u128;
            let host_bits = 32 - u32::from(n.prefix());
            let last = base + ((1u128 << host_bits) - 1);
            let addr = base.checked_add(offset).filter(|a| *a <= last).ok_or_else(exhausted)?;
            let addr = Ipv4Addr::from(addr as u32);
            Ipv4Network::new(addr, n.prefix())
                .map(IpNetwork::V4)
                .map_err(|e| ProvisionError::invalid("ip address", e.to_string()))
        }
        IpNetwork::V6(n) => {
            let base = u128::from(n.network());
            let host_bits = 128 - u32::from(n.prefix());
            let last = if host_bits == 128 {
                u128::MAX
            } else {
                base + ((1u128 << host_bits) - 1)
            };
            let addr = base.checked_add(offset).filter(|a| *a <= last).ok_or_else(exhausted)?;
            Ipv6Network::new(Ipv6Addr::from(addr), n.prefix())
                .map(IpNetwork::V6)
                .map_err(|e| ProvisionError::invalid("ip address", e.to_string()))
        }
    }
}

/// Render VLAN ids as a comma separated list for log lines
pub fn join_vids(vids: &[u16]) -> String {
    vids.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn net(s: &str) -> IpNetwork {
        s.parse().unwrap()
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("RJ45 access port"), "rj45-access-port");
        assert_eq!(slugify("  Switch  "), "switch");
    }

    #[test]
    fn test_is_valid_vlan_name() {
        assert!(is_valid_vlan_name("students", 15));
        assert!(is_valid_vlan_name("lab-wifi", 15));
        assert!(!is_valid_vlan_name("", 15));
        assert!(!is_valid_vlan_name("Lab", 15));
        assert!(!is_valid_vlan_name("lab1", 15));
        assert!(!is_valid_vlan_name("lab net", 15));
        assert!(!is_valid_vlan_name("sixteen-letters-", 15));
    }

    #[test]
    fn test_canonical_network() {
        assert_eq!(canonical_network(net("10.0.0.7/24")), net("10.0.0.0/24"));
        assert_eq!(canonical_network(net("2001:db8::5/64")), net("2001:db8::/64"));
    }

    #[test]
    fn test_host_at_ipv4() {
        assert_eq!(host_at(net("10.0.0.0/24"), 1).unwrap(), net("10.0.0.1/24"));
        assert_eq!(host_at(net("10.0.0.0/24"), 4).unwrap(), net("10.0.0.4/24"));
        assert_eq!(host_at(net("10.0.0.0/24"), 255).unwrap(), net("10.0.0.255/24"));
        assert!(host_at(net("10.0.0.0/24"), 256).is_err());
        assert!(host_at(net("10.0.0.0/31"), 2).is_err());
    }

    #[test]
    fn test_host_at_ipv6() {
        assert_eq!(host_at(net("2001:db8::/64"), 2).unwrap(), net("2001:db8::2/64"));
        assert!(host_at(net("2001:db8::/127"), 2).is_err());
        assert_eq!(host_at(net("::/0"), 1).unwrap(), net("::1/0"));
    }

    #[test]
    fn test_join_vids() {
        assert_eq!(join_vids(&[10, 20]), "10,20");
        assert_eq!(join_vids(&[]), "");
    }
}
