//! Device connection management.
//!
//! This file holds the device-compatibility table and builds new links:
//! validation happens before any mutation, port labels are picked from the
//! endpoints' existing links, and hosts plugged into a switch get their
//! `network` back-reference.

use log::debug;

use super::store::TopologyStore;
use super::types::{Bandwidth, DeviceRole, Edge, LinkMedium, Node, NodeKind};

/// Reasons a connect intent is rejected. The store is left untouched.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConnectError {
    #[error("Unknown node: {0}")]
    UnknownNode(String),

    #[error("Cannot connect {0} to itself")]
    SelfLink(String),

    #[error("'{0}' is not a network device and cannot be linked")]
    NotADevice(String),

    #[error("Cannot connect a {from} to a {to}")]
    Incompatible { from: DeviceRole, to: DeviceRole },
}

/// Attributes of a new link
#[derive(Debug, Clone, Default)]
pub struct LinkOptions {
    pub medium: LinkMedium,
    pub bandwidth: Bandwidth,
    pub source_port: Option<String>,
    pub target_port: Option<String>,
    pub vlan: Option<String>,
}

impl LinkOptions {
    pub fn medium(mut self, medium: LinkMedium) -> Self {
        self.medium = medium;
        self
    }

    pub fn vlan(mut self, vlan: impl Into<String>) -> Self {
        self.vlan = Some(vlan.into());
        self
    }

    pub fn ports(mut self, source: impl Into<String>, target: impl Into<String>) -> Self {
        self.source_port = Some(source.into());
        self.target_port = Some(target.into());
        self
    }
}

/// Symmetric device-compatibility table
pub fn is_compatible(a: DeviceRole, b: DeviceRole) -> bool {
    use DeviceRole::*;

    let allowed = |x: DeviceRole, y: DeviceRole| match x {
        Pc | Server => matches!(y, Switch | L3Switch),
        Switch => matches!(y, Switch | L3Switch | Router | Firewall),
        L3Switch => matches!(y, L3Switch | Router | Firewall),
        Router => matches!(y, Router | Firewall | Cloud),
        Firewall => matches!(y, Firewall | Cloud),
        Cloud => false,
    };
    allowed(a, b) || allowed(b, a)
}

fn device_role(store: &TopologyStore, id: &str) -> Result<DeviceRole, ConnectError> {
    let node = store
        .node(id)
        .ok_or_else(|| ConnectError::UnknownNode(id.to_string()))?;
    match node.role {
        Some(role) if node.kind == NodeKind::Device => Ok(role),
        _ => Err(ConnectError::NotADevice(node.title().to_string())),
    }
}

/// Validate a connect intent and return both endpoint roles
pub fn check_connection(
    store: &TopologyStore,
    source: &str,
    target: &str,
) -> Result<(DeviceRole, DeviceRole), ConnectError> {
    if source == target {
        return Err(ConnectError::SelfLink(source.to_string()));
    }
    let from = device_role(store, source)?;
    let to = device_role(store, target)?;
    if !is_compatible(from, to) {
        return Err(ConnectError::Incompatible { from, to });
    }
    Ok((from, to))
}

/// Next unused `Gi0/{n}` label on `node_id`, scanning its existing links
pub fn next_free_port(edges: &[Edge], node_id: &str) -> String {
    let used: Vec<&str> = edges.iter().filter_map(|e| e.port_on(node_id)).collect();
    (1..)
        .map(|n| format!("Gi0/{n}"))
        .find(|port| !used.contains(&port.as_str()))
        .unwrap_or_default()
}

/// Validate and add a link with id `edge_id`. Returns the new edge's id.
pub fn connect(
    store: &mut TopologyStore,
    source: &str,
    target: &str,
    options: LinkOptions,
    edge_id: String,
) -> Result<String, ConnectError> {
    let (from, to) = check_connection(store, source, target)?;

    let mut edge = Edge::new(edge_id, source, target);
    edge.medium = options.medium;
    edge.bandwidth = options.bandwidth;
    edge.source_port = Some(
        options
            .source_port
            .unwrap_or_else(|| next_free_port(store.edges(), source)),
    );
    edge.target_port = Some(
        options
            .target_port
            .unwrap_or_else(|| next_free_port(store.edges(), target)),
    );
    edge.set_vlan(options.vlan);

    let attachment = match (from.is_host(), to.is_host()) {
        (true, false) if to.is_switching() => Some((source, target)),
        (false, true) if from.is_switching() => Some((target, source)),
        _ => None,
    };
    if let Some((host, switch)) = attachment {
        attach_host(store, host, switch);
    }

    debug!("Connected {} ({}) to {} ({}) as {}", source, from, target, to, edge.id);
    let id = edge.id.clone();
    let mut edges = store.edges().to_vec();
    edges.push(edge);
    store.set_edges(edges);
    Ok(id)
}

/// Record `switch` as the host's network unless it already has one
fn attach_host(store: &mut TopologyStore, host: &str, switch: &str) {
    if store.node(host).is_some_and(|n| n.network.is_some()) {
        return;
    }
    let nodes: Vec<Node> = store
        .nodes()
        .iter()
        .map(|n| {
            let mut n = n.clone();
            if n.id == host {
                n.network = Some(switch.to_string());
            }
            n
        })
        .collect();
    store.set_nodes(nodes);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::types::{Position, Size, Snapshot};

    fn store() -> TopologyStore {
        TopologyStore::from_snapshot(Snapshot::new(
            vec![
                Node::device("pc1", DeviceRole::Pc, "PC1", Position::default()),
                Node::device("pc2", DeviceRole::Pc, "PC2", Position::default()),
                Node::device("sw", DeviceRole::Switch, "SW", Position::default()),
                Node::device("r", DeviceRole::Router, "R", Position::default()),
                Node::device("cloud", DeviceRole::Cloud, "Internet", Position::default()),
                Node::container("g", NodeKind::Group, "LAN", Position::default(), Size::new(10.0, 10.0)),
            ],
            Vec::new(),
        ))
    }

    #[test]
    fn test_compatibility_table() {
        use DeviceRole::*;
        assert!(is_compatible(Pc, Switch));
        assert!(is_compatible(Switch, Pc));
        assert!(is_compatible(Switch, Switch));
        assert!(is_compatible(Router, Switch));
        assert!(is_compatible(Router, Router));
        assert!(is_compatible(Firewall, Cloud));
        assert!(is_compatible(Cloud, Router));
        assert!(!is_compatible(Pc, Pc));
        assert!(!is_compatible(Server, Pc));
        assert!(!is_compatible(Switch, Cloud));
        assert!(!is_compatible(Pc, Router));
    }

    #[test]
    fn test_rejection_names_both_roles() {
        let mut s = store();
        let revision = s.revision();
        let err = connect(&mut s, "pc1", "pc2", LinkOptions::default(), "e".into()).unwrap_err();
        assert_eq!(err, ConnectError::Incompatible { from: DeviceRole::Pc, to: DeviceRole::Pc });
        assert_eq!(err.to_string(), "Cannot connect a PC to a PC");

        let err = connect(&mut s, "sw", "cloud", LinkOptions::default(), "e".into()).unwrap_err();
        assert_eq!(err.to_string(), "Cannot connect a switch to a cloud");
        assert_eq!(s.revision(), revision);
    }

    #[test]
    fn test_non_devices_and_self_links() {
        let mut s = store();
        assert!(matches!(
            connect(&mut s, "g", "sw", LinkOptions::default(), "e".into()),
            Err(ConnectError::NotADevice(_))
        ));
        assert_eq!(
            connect(&mut s, "sw", "sw", LinkOptions::default(), "e".into()),
            Err(ConnectError::SelfLink("sw".into()))
        );
        assert_eq!(
            connect(&mut s, "sw", "ghost", LinkOptions::default(), "e".into()),
            Err(ConnectError::UnknownNode("ghost".into()))
        );
    }

    #[test]
    fn test_connect_assigns_ports_and_network() {
        let mut s = store();
        connect(&mut s, "pc1", "sw", LinkOptions::default(), "e1".into()).unwrap();
        connect(&mut s, "sw", "pc2", LinkOptions::default(), "e2".into()).unwrap();
        connect(&mut s, "r", "sw", LinkOptions::default().vlan("10"), "e3".into()).unwrap();

        assert_eq!(s.edge("e1").unwrap().port_on("sw"), Some("Gi0/1"));
        assert_eq!(s.edge("e2").unwrap().port_on("sw"), Some("Gi0/2"));
        assert_eq!(s.edge("e3").unwrap().port_on("sw"), Some("Gi0/3"));
        assert_eq!(s.edge("e3").unwrap().vlan_tag(), Some("10"));
        assert_eq!(s.node("pc1").unwrap().network.as_deref(), Some("sw"));
        assert_eq!(s.node("pc2").unwrap().network.as_deref(), Some("sw"));
    }
}
