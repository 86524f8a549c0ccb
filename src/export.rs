//! Interface data for configuration rendering.
//!
//! For every router- or switch-class device this module lists, per attached
//! link, the local and remote port, the VLAN tag and how the neighbor should
//! be treated (access port towards a host, trunk towards another switching or
//! routing device, routed towards the perimeter). Rendering vendor syntax
//! from this is left to the caller.

use std::cmp::Ordering;
use std::collections::HashMap;

use log::debug;
use serde::Serialize;

use crate::topology::types::{DeviceRole, Edge, Node, NodeKind};

/// How a device port faces its neighbor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NeighborClass {
    /// End host: untagged access port
    Access,
    /// Switch or router: trunk carrying VLANs
    Trunk,
    /// Firewall or internet uplink
    Routed,
}

impl NeighborClass {
    pub fn of(role: DeviceRole) -> Self {
        if role.is_host() {
            Self::Access
        } else if role.is_infrastructure() {
            Self::Routed
        } else {
            Self::Trunk
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InterfaceBinding {
    pub local_port: Option<String>,
    pub remote_port: Option<String>,
    pub vlan: Option<String>,
    pub neighbor_id: String,
    pub neighbor_role: DeviceRole,
    pub neighbor_class: NeighborClass,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceInterfaces {
    pub device_id: String,
    pub role: DeviceRole,
    pub hostname: String,
    pub interfaces: Vec<InterfaceBinding>,
    /// Every VLAN seen on the device's links, declared once
    pub vlans: Vec<String>,
}

fn exports_interfaces(node: &Node) -> bool {
    node.has_role(|r| r.is_router_class() || r.is_switch_class())
}

/// Interface data for one router/switch, `None` for anything else
pub fn device_interfaces(nodes: &[Node], edges: &[Edge], device_id: &str) -> Option<DeviceInterfaces> {
    let by_id: HashMap<&str, &Node> = nodes.iter().map(|n| (n.id.as_str(), n)).collect();
    let device = by_id.get(device_id).filter(|n| exports_interfaces(n))?;
    Some(collect_interfaces(device, &by_id, edges))
}

/// Interface data for every router/switch, in node order
pub fn all_device_interfaces(nodes: &[Node], edges: &[Edge]) -> Vec<DeviceInterfaces> {
    let by_id: HashMap<&str, &Node> = nodes.iter().map(|n| (n.id.as_str(), n)).collect();
    nodes
        .iter()
        .filter(|n| exports_interfaces(n))
        .map(|device| collect_interfaces(device, &by_id, edges))
        .collect()
}

fn collect_interfaces(device: &Node, by_id: &HashMap<&str, &Node>, edges: &[Edge]) -> DeviceInterfaces {
    let mut interfaces = Vec::new();
    for edge in edges.iter().filter(|e| e.touches(&device.id)) {
        let Some(neighbor_id) = edge.other_end(&device.id) else {
            continue;
        };
        let neighbor = by_id
            .get(neighbor_id)
            .filter(|n| n.kind == NodeKind::Device)
            .and_then(|n| n.role);
        let Some(neighbor_role) = neighbor else {
            debug!("Skipping link {} of {}: neighbor is not a device", edge.id, device.id);
            continue;
        };
        interfaces.push(InterfaceBinding {
            local_port: edge.port_on(&device.id).map(str::to_string),
            remote_port: edge.port_on(neighbor_id).map(str::to_string),
            vlan: edge.vlan_tag().map(str::to_string),
            neighbor_id: neighbor_id.to_string(),
            neighbor_role,
            neighbor_class: NeighborClass::of(neighbor_role),
        });
    }

    let mut vlans: Vec<String> = interfaces.iter().filter_map(|i| i.vlan.clone()).collect();
    vlans.sort_by(|a, b| compare_vlans(a, b));
    vlans.dedup();

    DeviceInterfaces {
        device_id: device.id.clone(),
        role: device.role.unwrap_or(DeviceRole::Switch),
        hostname: hostname(device),
        interfaces,
        vlans,
    }
}

/// Numeric tags in numeric order, then named tags alphabetically
fn compare_vlans(a: &str, b: &str) -> Ordering {
    match (a.parse::<u32>(), b.parse::<u32>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

fn hostname(node: &Node) -> String {
    let name: String = node
        .title()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-");
    if name.is_empty() {
        node.id.clone()
    } else {
        name
    }
}
