//! IP address registry.
//!
//! This file tracks which nodes claim which static addresses so that
//! conflicting claims can be reported on every side, not just the latecomer.

use std::collections::HashMap;
use std::net::Ipv4Addr;

/// Registry of static addresses and the nodes claiming them
#[derive(Debug, Default)]
pub struct IpRegistry {
    /// IP -> claiming node ids, in claim order
    owners: HashMap<Ipv4Addr, Vec<String>>,
    /// Claim order of distinct addresses, for deterministic reporting
    order: Vec<Ipv4Addr>,
}

impl IpRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a claim. Returns the first owner when the address was already taken.
    pub fn register(&mut self, ip: Ipv4Addr, node_id: &str) -> Option<String> {
        if !self.owners.contains_key(&ip) {
            self.order.push(ip);
        }
        let owners = self.owners.entry(ip).or_default();
        let first = owners.first().cloned();
        owners.push(node_id.to_string());
        first
    }

    pub fn owners_of(&self, ip: Ipv4Addr) -> &[String] {
        self.owners.get(&ip).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_assigned(&self, ip: Ipv4Addr) -> bool {
        self.owners.contains_key(&ip)
    }

    /// Addresses claimed by more than one node, with all of their claimants
    pub fn conflicts(&self) -> impl Iterator<Item = (Ipv4Addr, &[String])> + '_ {
        self.order
            .iter()
            .map(|ip| (*ip, self.owners_of(*ip)))
            .filter(|(_, owners)| owners.len() > 1)
    }
}
