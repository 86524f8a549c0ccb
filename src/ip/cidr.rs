//! Label address parsing.
//!
//! Node labels carry addressing as free text: hosts have an `IP: a.b.c.d[/n]`
//! line (or `IP: DHCP` / `(DHCP)`), switches carry their subnet as a bare
//! `a.b.c.d/n` somewhere in the label.

use std::net::Ipv4Addr;
use std::sync::LazyLock;

use ipnetwork::Ipv4Network;
use regex::Regex;

static IP_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*IP\s*:\s*([^\s/]+)(?:\s*/\s*(\d{1,2}))?\s*$").expect("Invalid IP line regex")
});

static DHCP_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*\(?\s*DHCP\s*\)?\s*$").expect("Invalid DHCP regex"));

static CIDR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d{1,3}(?:\.\d{1,3}){3})/(\d{1,2})\b").expect("Invalid CIDR regex")
});

/// Address configured on a host label
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostAddress {
    Static { addr: Ipv4Addr, prefix: Option<u8> },
    Dhcp,
}

impl HostAddress {
    pub fn static_addr(&self) -> Option<Ipv4Addr> {
        match self {
            Self::Static { addr, .. } => Some(*addr),
            Self::Dhcp => None,
        }
    }
}

/// Parse the address line of a label.
///
/// Returns the first `IP:` line holding either a valid IPv4 address or the
/// `DHCP` token, or a bare `(DHCP)` line. Garbled `IP:` values are skipped.
///
/// # Examples
/// ```
/// use netsketch::ip::cidr::{parse_host_address, HostAddress};
///
/// let addr = parse_host_address("PC-1\nIP: 192.168.10.50/24");
/// assert_eq!(addr.and_then(|a| a.static_addr()), Some("192.168.10.50".parse().unwrap()));
/// assert_eq!(parse_host_address("PC-2\nIP: dhcp"), Some(HostAddress::Dhcp));
/// assert_eq!(parse_host_address("PC-3"), None);
/// ```
pub fn parse_host_address(label: &str) -> Option<HostAddress> {
    label.lines().find_map(|line| {
        if DHCP_LINE.is_match(line) {
            return Some(HostAddress::Dhcp);
        }
        let caps = IP_LINE.captures(line)?;
        let value = &caps[1];
        if value.eq_ignore_ascii_case("DHCP") {
            return Some(HostAddress::Dhcp);
        }
        let addr = value.parse::<Ipv4Addr>().ok()?;
        let prefix = caps.get(2).and_then(|m| m.as_str().parse::<u8>().ok());
        Some(HostAddress::Static { addr, prefix })
    })
}

/// First `a.b.c.d/n` found in a label that forms a valid IPv4 network
pub fn parse_label_cidr(label: &str) -> Option<Ipv4Network> {
    CIDR.captures_iter(label).find_map(|caps| {
        let addr = caps[1].parse::<Ipv4Addr>().ok()?;
        let prefix = caps[2].parse::<u8>().ok()?;
        Ipv4Network::new(addr, prefix).ok()
    })
}

/// Prefix-mask membership: `(ip & mask) == (base & mask)`
pub fn subnet_contains(network: Ipv4Network, ip: Ipv4Addr) -> bool {
    let mask = u32::from(network.mask());
    (u32::from(ip) & mask) == (u32::from(network.ip()) & mask)
}
