//! View scoping.
//!
//! Computes which nodes and edges are visible for the current focus. With no
//! focus the whole topology is shown (hosts subject to the "show hosts"
//! toggle). With a focus only the focused sub-network and its context remain.

use std::collections::{BTreeSet, HashSet};

use log::{debug, warn};

use crate::topology::store::TopologyStore;
use crate::topology::types::{Edge, Node, NodeKind};

/// Visible node and edge ids for one scope
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Visibility {
    pub nodes: BTreeSet<String>,
    pub edges: BTreeSet<String>,
}

impl Visibility {
    pub fn shows_node(&self, id: &str) -> bool {
        self.nodes.contains(id)
    }

    pub fn shows_edge(&self, id: &str) -> bool {
        self.edges.contains(id)
    }
}

/// Compute visibility for `focus` (`None` is the global scope).
///
/// A focus that no longer names a live node falls back to the global scope.
pub fn compute_visibility(nodes: &[Node], edges: &[Edge], focus: Option<&str>, show_hosts: bool) -> Visibility {
    match focus {
        Some(focus) if nodes.iter().any(|n| n.id == focus) => focused_visibility(nodes, edges, focus),
        Some(stale) => {
            warn!("Focus {} no longer exists, showing the global scope", stale);
            global_visibility(nodes, edges, show_hosts)
        }
        None => global_visibility(nodes, edges, show_hosts),
    }
}

fn global_visibility(nodes: &[Node], edges: &[Edge], show_hosts: bool) -> Visibility {
    let visible_nodes: BTreeSet<String> = nodes
        .iter()
        .filter(|n| show_hosts || !n.is_host())
        .map(|n| n.id.clone())
        .collect();
    let visible_edges = edges
        .iter()
        .filter(|e| visible_nodes.contains(&e.source) && visible_nodes.contains(&e.target))
        .map(|e| e.id.clone())
        .collect();
    Visibility { nodes: visible_nodes, edges: visible_edges }
}

fn focused_visibility(nodes: &[Node], edges: &[Edge], focus: &str) -> Visibility {
    let focus_vlans: HashSet<&str> = edges
        .iter()
        .filter(|e| e.touches(focus))
        .filter_map(Edge::vlan_tag)
        .collect();
    let shares_vlan = |e: &Edge| e.vlan_tag().is_some_and(|tag| focus_vlans.contains(tag));

    let focus_parent = nodes
        .iter()
        .find(|n| n.id == focus)
        .and_then(|n| n.parent_id.as_deref());

    let vlan_members: HashSet<&str> = edges
        .iter()
        .filter(|&e| shares_vlan(e))
        .flat_map(|e| [e.source.as_str(), e.target.as_str()])
        .collect();

    let visible_nodes: BTreeSet<String> = nodes
        .iter()
        .filter(|n| {
            n.id == focus
                || n.network.as_deref() == Some(focus)
                || n.parent_id.as_deref() == Some(focus)
                || focus_parent == Some(n.id.as_str())
                || is_context_node(n)
                || vlan_members.contains(n.id.as_str())
        })
        .map(|n| n.id.clone())
        .collect();

    let visible_edges: BTreeSet<String> = edges
        .iter()
        .filter(|&e| e.touches(focus) || shares_vlan(e))
        .map(|e| e.id.clone())
        .collect();

    debug!(
        "Scope {}: {} node(s), {} edge(s) visible, VLANs {:?}",
        focus,
        visible_nodes.len(),
        visible_edges.len(),
        focus_vlans
    );
    Visibility { nodes: visible_nodes, edges: visible_edges }
}

/// Routers, perimeter devices and annotations stay visible in every scope
fn is_context_node(node: &Node) -> bool {
    node.kind == NodeKind::Annotation || node.is_router_class() || node.has_role(|r| r.is_infrastructure())
}

/// Write visibility flags for `focus` into the store.
///
/// Only the `hidden`/`focused` flags are touched. A collection is replaced
/// only if one of its flags actually changed, so recomputing an unchanged
/// scope leaves the store revision alone. Returns whether anything changed.
pub fn apply_scope(store: &mut TopologyStore, focus: Option<&str>, show_hosts: bool) -> bool {
    let visibility = compute_visibility(store.nodes(), store.edges(), focus, show_hosts);
    let focus = focus.filter(|id| store.contains_node(id));

    let nodes_changed = store.nodes().iter().any(|n| {
        n.hidden == visibility.shows_node(&n.id) || n.focused != (Some(n.id.as_str()) == focus)
    });
    let edges_changed = store
        .edges()
        .iter()
        .any(|e| e.hidden == visibility.shows_edge(&e.id));

    if nodes_changed {
        let nodes = store
            .nodes()
            .iter()
            .map(|n| Node {
                hidden: !visibility.shows_node(&n.id),
                focused: Some(n.id.as_str()) == focus,
                ..n.clone()
            })
            .collect();
        store.set_nodes(nodes);
    }
    if edges_changed {
        let edges = store
            .edges()
            .iter()
            .map(|e| Edge {
                hidden: !visibility.shows_edge(&e.id),
                ..e.clone()
            })
            .collect();
        store.set_edges(edges);
    }
    nodes_changed || edges_changed
}
