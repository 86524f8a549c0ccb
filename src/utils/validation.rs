//! Address validation.
//!
//! This module scans the topology for addressing mistakes: duplicate static
//! addresses, hosts without any address and hosts whose address falls outside
//! the subnet declared on the switch they are attached to.

use std::collections::{BTreeMap, HashMap};

use crate::ip::cidr::{parse_host_address, parse_label_cidr, subnet_contains, HostAddress};
use crate::ip::registry::IpRegistry;
use crate::topology::types::{DeviceRole, Node, NodeKind};

/// Validate addressing over all nodes
///
/// Checks for:
/// - Duplicate static IPs (every node claiming the address is flagged)
/// - Hosts (PCs and servers) with no `IP:` line
/// - Hosts whose static IP is outside the CIDR in their switch's label
///
/// DHCP hosts count as configured and are never subnet-checked.
///
/// # Arguments
/// * `nodes` - All nodes of the topology
///
/// # Returns
/// * Map from node id to its warning text; nodes without warnings are absent.
///   Several warnings on one node are joined with `"; "`.
///
/// # Examples
/// ```
/// use netsketch::topology::{DeviceRole, Node, Position};
/// use netsketch::utils::validation::validate_addresses;
///
/// let nodes = vec![
///     Node::device("pc-1", DeviceRole::Pc, "PC-1\nIP: 10.0.0.5", Position::default()),
///     Node::device("pc-2", DeviceRole::Pc, "PC-2\nIP: 10.0.0.5", Position::default()),
///     Node::device("pc-3", DeviceRole::Pc, "PC-3\n(DHCP)", Position::default()),
/// ];
/// let warnings = validate_addresses(&nodes);
/// assert_eq!(warnings.len(), 2);
/// assert!(!warnings.contains_key("pc-3"));
/// ```
pub fn validate_addresses(nodes: &[Node]) -> BTreeMap<String, String> {
    let by_id: HashMap<&str, &Node> = nodes.iter().map(|n| (n.id.as_str(), n)).collect();
    let mut findings: BTreeMap<String, Vec<String>> = BTreeMap::new();
    let mut registry = IpRegistry::new();

    for node in nodes.iter().filter(|n| n.kind == NodeKind::Device) {
        let address = parse_host_address(&node.label);

        match address {
            Some(HostAddress::Static { addr, .. }) => {
                registry.register(addr, &node.id);
                if let Some(warning) = subnet_mismatch(node, addr, &by_id) {
                    findings.entry(node.id.clone()).or_default().push(warning);
                }
            }
            Some(HostAddress::Dhcp) => {}
            None if node.is_host() => {
                findings
                    .entry(node.id.clone())
                    .or_default()
                    .push("No IP configured".to_string());
            }
            None => {}
        }
    }

    for (ip, owners) in registry.conflicts() {
        log::warn!("Duplicate IP {} claimed by {} node(s)", ip, owners.len());
        for owner in owners {
            let others: Vec<&str> = owners
                .iter()
                .filter(|o| *o != owner)
                .map(String::as_str)
                .collect();
            let warning = if others.is_empty() {
                format!("Duplicate IP {}", ip)
            } else {
                format!("Duplicate IP {} (also used by {})", ip, others.join(", "))
            };
            // duplicates lead the message
            findings.entry(owner.clone()).or_default().insert(0, warning);
        }
    }

    log::info!("Address validation: {} node(s) with warnings", findings.len());
    findings
        .into_iter()
        .map(|(id, warnings)| (id, warnings.join("; ")))
        .collect()
}

fn subnet_mismatch(node: &Node, addr: std::net::Ipv4Addr, by_id: &HashMap<&str, &Node>) -> Option<String> {
    if !node.is_host() {
        return None;
    }
    let switch = node.network.as_deref().and_then(|id| by_id.get(id))?;
    if !switch.has_role(DeviceRole::is_switching) {
        return None;
    }
    let subnet = parse_label_cidr(&switch.label)?;
    if subnet_contains(subnet, addr) {
        None
    } else {
        Some(format!("IP {} not in declared subnet {}", addr, subnet))
    }
}
