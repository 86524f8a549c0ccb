//! IP address parsing, allocation and ownership tracking.
//!
//! This module handles reading addresses and subnets out of node labels,
//! deriving host addresses for generated networks and tracking which nodes
//! claim which addresses.

pub mod allocator;
pub mod cidr;
pub mod registry;

// Re-export commonly used types
pub use allocator::{default_network, host_addresses, AllocationError};
pub use cidr::{parse_host_address, parse_label_cidr, subnet_contains, HostAddress};
pub use registry::IpRegistry;
