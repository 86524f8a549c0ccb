//! Host address derivation for generated networks.
//!
//! Generated hosts take consecutive addresses starting at the second usable
//! address of their network (the first one is left for the gateway). Networks
//! without a declared CIDR fall back to a private /24 chosen by index.

use std::net::Ipv4Addr;

use ipnetwork::Ipv4Network;

/// Offset of the first generated host from the network base
pub const FIRST_HOST_OFFSET: u32 = 2;

/// Third octet of the first fallback network (`192.168.100.0/24`)
pub const FALLBACK_THIRD_OCTET: u32 = 100;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AllocationError {
    #[error("Network {network} has no room for {requested} generated host(s)")]
    Exhausted { network: Ipv4Network, requested: usize },

    #[error("No fallback /24 left for network index {0}")]
    NoFallback(usize),
}

/// Private fallback network for the `index`-th network without a CIDR
pub fn default_network(index: usize) -> Result<Ipv4Network, AllocationError> {
    let third = FALLBACK_THIRD_OCTET + index as u32;
    if third > 255 {
        return Err(AllocationError::NoFallback(index));
    }
    Ipv4Network::new(Ipv4Addr::new(192, 168, third as u8, 0), 24)
        .map_err(|_| AllocationError::NoFallback(index))
}

/// `count` consecutive host addresses inside `network`, skipping the
/// network address, the gateway slot and the broadcast address.
///
/// # Examples
/// ```
/// use netsketch::ip::allocator::host_addresses;
///
/// let hosts = host_addresses("10.0.0.0/29".parse().unwrap(), 2).unwrap();
/// assert_eq!(hosts, vec!["10.0.0.2".parse::<std::net::Ipv4Addr>().unwrap(), "10.0.0.3".parse().unwrap()]);
/// assert!(host_addresses("10.0.0.0/30".parse().unwrap(), 2).is_err());
/// ```
pub fn host_addresses(network: Ipv4Network, count: usize) -> Result<Vec<Ipv4Addr>, AllocationError> {
    let size = 1u64 << (32 - u32::from(network.prefix()));
    let last_usable = size.saturating_sub(2);
    let wanted_last = u64::from(FIRST_HOST_OFFSET) + count as u64 - 1;
    if count > 0 && wanted_last > last_usable {
        return Err(AllocationError::Exhausted { network, requested: count });
    }

    let base = u32::from(network.network());
    Ok((0..count as u32)
        .map(|i| Ipv4Addr::from(base + FIRST_HOST_OFFSET + i))
        .collect())
}
