//! Simulated ping.
//!
//! A ping first needs a physical route (see [`crate::analysis::path`]). The
//! route is then checked against the VLAN policy:
//!
//! - the *required* VLAN is the tag of the first tagged edge on the route;
//!   a route with no tagged edge passes unconditionally
//! - a route touching a DMZ context (a server, or a node or its container
//!   labelled as DMZ) skips the VLAN check
//! - every tagged edge whose tag differs from the required VLAN must have a
//!   router-class device on one of its two ends

use std::collections::HashMap;
use std::fmt;

use log::{debug, info};
use serde::Serialize;

use crate::analysis::path::{find_route, Route};
use crate::topology::types::{Edge, Node, NodeKind};

const DMZ_MARKER: &str = "dmz";

/// Result of a simulated ping
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum PingVerdict {
    Reachable,
    NoRoute,
    /// One of the endpoints is a container, an annotation or unknown
    NotADevice { id: String },
    VlanBlocked {
        edge_id: String,
        required: String,
        found: String,
    },
}

impl PingVerdict {
    pub fn passed(&self) -> bool {
        matches!(self, Self::Reachable)
    }

    /// User-facing verdict text
    pub fn message(&self) -> String {
        match self {
            Self::Reachable => "Ping successful".to_string(),
            Self::NoRoute => "No physical route".to_string(),
            Self::NotADevice { id } => format!("{} is not a device", id),
            Self::VlanBlocked { .. } => "VLAN/subnet incompatible".to_string(),
        }
    }
}

impl fmt::Display for PingVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::VlanBlocked { edge_id, required, found } => write!(
                f,
                "{} (link {} carries VLAN {}, path requires VLAN {})",
                self.message(),
                edge_id,
                found,
                required
            ),
            _ => f.write_str(&self.message()),
        }
    }
}

/// Verdict plus the route it was computed on. The route is kept on failure
/// too so callers can highlight where the path was blocked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PingOutcome {
    pub verdict: PingVerdict,
    pub route: Option<Route>,
}

impl PingOutcome {
    fn without_route(verdict: PingVerdict) -> Self {
        Self { verdict, route: None }
    }

    /// Edge ids to highlight. Empty unless the ping passed.
    pub fn highlighted_edges(&self) -> &[String] {
        match (&self.verdict, &self.route) {
            (PingVerdict::Reachable, Some(route)) => route.edges.as_slice(),
            _ => &[],
        }
    }
}

/// Run a ping from `source` to `target` over the current topology
pub fn simulate_ping(source: &str, target: &str, nodes: &[Node], edges: &[Edge]) -> PingOutcome {
    let by_id: HashMap<&str, &Node> = nodes.iter().map(|n| (n.id.as_str(), n)).collect();

    for id in [source, target] {
        if !by_id.get(id).is_some_and(|n| n.kind == NodeKind::Device) {
            debug!("Ping endpoint {} is not a device", id);
            return PingOutcome::without_route(PingVerdict::NotADevice { id: id.to_string() });
        }
    }

    let Some(route) = find_route(source, target, edges) else {
        return PingOutcome::without_route(PingVerdict::NoRoute);
    };
    if route.nodes.len() < 2 {
        return PingOutcome { verdict: PingVerdict::NoRoute, route: Some(route) };
    }

    let verdict = evaluate_route(&route, &by_id, edges);
    info!("Ping {} -> {}: {}", source, target, verdict);
    PingOutcome { verdict, route: Some(route) }
}

/// Apply the VLAN policy to an already found route
pub fn evaluate_route(route: &Route, by_id: &HashMap<&str, &Node>, edges: &[Edge]) -> PingVerdict {
    let edge_by_id: HashMap<&str, &Edge> = edges.iter().map(|e| (e.id.as_str(), e)).collect();
    let path_edges: Vec<&Edge> = route
        .edges
        .iter()
        .filter_map(|id| edge_by_id.get(id.as_str()).copied())
        .collect();

    let Some(required) = path_edges.iter().find_map(|e| e.vlan_tag()) else {
        return PingVerdict::Reachable;
    };

    if let Some(dmz) = route.nodes.iter().find(|id| in_dmz_context(id, by_id)) {
        debug!("VLAN check waived: {} is in a DMZ context", dmz);
        return PingVerdict::Reachable;
    }

    let is_router = |id: &str| by_id.get(id).is_some_and(|n| n.is_router_class());
    for edge in path_edges {
        let Some(tag) = edge.vlan_tag() else {
            continue;
        };
        if tag == required || is_router(&edge.source) || is_router(&edge.target) {
            continue;
        }
        return PingVerdict::VlanBlocked {
            edge_id: edge.id.clone(),
            required: required.to_string(),
            found: tag.to_string(),
        };
    }

    PingVerdict::Reachable
}

fn in_dmz_context(id: &str, by_id: &HashMap<&str, &Node>) -> bool {
    let Some(node) = by_id.get(id) else {
        return false;
    };
    if node.is_server() || mentions_dmz(&node.label) {
        return true;
    }
    node.parent_id
        .as_deref()
        .and_then(|parent| by_id.get(parent))
        .is_some_and(|parent| mentions_dmz(&parent.label))
}

fn mentions_dmz(label: &str) -> bool {
    label.to_ascii_lowercase().contains(DMZ_MARKER)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::types::{DeviceRole, Position, Size};

    fn device(id: &str, role: DeviceRole) -> Node {
        Node::device(id, role, role.default_label(), Position::default())
    }

    /// pc-a - sw1 =10= mid =20= sw2 - pc-b
    fn two_vlans(middle: DeviceRole) -> (Vec<Node>, Vec<Edge>) {
        let nodes = vec![
            device("pc-a", DeviceRole::Pc),
            device("sw1", DeviceRole::Switch),
            device("mid", middle),
            device("sw2", DeviceRole::Switch),
            device("pc-b", DeviceRole::Pc),
        ];
        let edges = vec![
            Edge::new("e1", "pc-a", "sw1"),
            Edge::new("e2", "sw1", "mid").with_vlan("10"),
            Edge::new("e3", "mid", "sw2").with_vlan("20"),
            Edge::new("e4", "sw2", "pc-b"),
        ];
        (nodes, edges)
    }

    #[test]
    fn test_router_allows_vlan_crossing() {
        let (nodes, edges) = two_vlans(DeviceRole::Router);
        let outcome = simulate_ping("pc-a", "pc-b", &nodes, &edges);
        assert_eq!(outcome.verdict, PingVerdict::Reachable);
        assert_eq!(outcome.highlighted_edges(), ["e1", "e2", "e3", "e4"]);
    }

    #[test]
    fn test_l3_switch_counts_as_router() {
        let (nodes, edges) = two_vlans(DeviceRole::L3Switch);
        assert!(simulate_ping("pc-a", "pc-b", &nodes, &edges).verdict.passed());
    }

    #[test]
    fn test_plain_switch_blocks_vlan_crossing() {
        let (nodes, edges) = two_vlans(DeviceRole::Switch);
        let outcome = simulate_ping("pc-a", "pc-b", &nodes, &edges);
        assert_eq!(
            outcome.verdict,
            PingVerdict::VlanBlocked {
                edge_id: "e3".into(),
                required: "10".into(),
                found: "20".into()
            }
        );
        assert_eq!(outcome.verdict.message(), "VLAN/subnet incompatible");
        assert!(outcome.highlighted_edges().is_empty());
        assert!(outcome.route.is_some());
    }

    #[test]
    fn test_dmz_server_waives_vlan_check() {
        let nodes = vec![
            device("pc-a", DeviceRole::Pc),
            device("srv", DeviceRole::Server),
            device("pc-b", DeviceRole::Pc),
        ];
        let edges = vec![
            Edge::new("e1", "pc-a", "srv").with_vlan("10"),
            Edge::new("e2", "srv", "pc-b").with_vlan("20"),
        ];
        assert!(simulate_ping("pc-a", "pc-b", &nodes, &edges).verdict.passed());
    }

    #[test]
    fn test_dmz_group_label_waives_vlan_check() {
        let (mut nodes, edges) = two_vlans(DeviceRole::Switch);
        nodes.push(Node::container("grp", NodeKind::Group, "DMZ - Web", Position::default(), Size::new(10.0, 10.0)));
        nodes[3].parent_id = Some("grp".into());
        assert!(simulate_ping("pc-a", "pc-b", &nodes, &edges).verdict.passed());
    }

    #[test]
    fn test_untagged_route_always_passes() {
        let nodes = vec![device("pc-a", DeviceRole::Pc), device("sw", DeviceRole::Switch), device("pc-b", DeviceRole::Pc)];
        let edges = vec![Edge::new("e1", "pc-a", "sw"), Edge::new("e2", "sw", "pc-b")];
        assert!(simulate_ping("pc-a", "pc-b", &nodes, &edges).verdict.passed());
    }

    #[test]
    fn test_no_route_and_bad_endpoints() {
        let nodes = vec![
            device("pc-a", DeviceRole::Pc),
            device("pc-b", DeviceRole::Pc),
            Node::container("grp", NodeKind::Group, "LAN", Position::default(), Size::new(1.0, 1.0)),
        ];
        assert_eq!(simulate_ping("pc-a", "pc-b", &nodes, &[]).verdict, PingVerdict::NoRoute);
        assert_eq!(simulate_ping("pc-a", "pc-a", &nodes, &[]).verdict, PingVerdict::NoRoute);
        assert_eq!(
            simulate_ping("pc-a", "grp", &nodes, &[]).verdict,
            PingVerdict::NotADevice { id: "grp".into() }
        );
        assert_eq!(
            simulate_ping("ghost", "pc-a", &nodes, &[]).verdict,
            PingVerdict::NotADevice { id: "ghost".into() }
        );
    }
}
