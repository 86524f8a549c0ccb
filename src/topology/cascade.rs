//! Containment and cascade engine.
//!
//! Resolves parent/child relationships and computes which ids a structural
//! operation has to take along with its target. Containers cascade downward
//! into their members; a switch inside a group cascades upward into that group
//! and all of its siblings.
//!
//! Every function here tolerates stale ids: an unknown id is a no-op.

use std::collections::BTreeSet;

use log::{debug, warn};

use super::store::TopologyStore;
use super::types::Node;

/// Closure of ids that must be removed together with `id`.
///
/// - container (`group`/`infraBox`): the container plus every direct child
/// - switch with a parent container: the switch, its parent and every node sharing that parent
/// - anything else (including unknown ids): just `{id}`
pub fn resolve_cascade_set(id: &str, nodes: &[Node]) -> BTreeSet<String> {
    let mut closure = BTreeSet::from([id.to_string()]);
    let Some(target) = nodes.iter().find(|n| n.id == id) else {
        return closure;
    };

    if target.is_container() {
        closure.extend(children_of(id, nodes).map(|n| n.id.clone()));
    } else if target.is_switch_class() {
        if let Some(parent_id) = &target.parent_id {
            closure.insert(parent_id.clone());
            closure.extend(children_of(parent_id, nodes).map(|n| n.id.clone()));
        }
    }

    debug!("Cascade set for {}: {} id(s)", id, closure.len());
    closure
}

/// Direct children of a container
pub fn children_of<'a>(parent_id: &'a str, nodes: &'a [Node]) -> impl Iterator<Item = &'a Node> + 'a {
    nodes
        .iter()
        .filter(move |n| n.parent_id.as_deref() == Some(parent_id))
}

/// Remove `id` and its cascade closure, plus every edge touching the closure.
/// An edge whose own id equals `id` is removed too. Returns whether anything changed.
pub fn delete(store: &mut TopologyStore, id: &str) -> bool {
    if !store.is_live(id) {
        warn!("Ignoring delete of unknown id {}", id);
        return false;
    }

    let closure = resolve_cascade_set(id, store.nodes());
    let nodes: Vec<Node> = store
        .nodes()
        .iter()
        .filter(|n| !closure.contains(&n.id))
        .map(|n| reparent_orphan(n, &closure, store.nodes()))
        .collect();
    let edges = store
        .edges()
        .iter()
        .filter(|e| e.id != id && !closure.contains(&e.source) && !closure.contains(&e.target))
        .cloned()
        .collect();

    debug!(
        "Deleting {}: {} node(s) removed",
        id,
        store.nodes().len() - nodes.len()
    );
    store.set_nodes(nodes);
    store.set_edges(edges);
    true
}

/// A survivor whose container is being removed moves up to the nearest
/// surviving ancestor, its position rebased through every removed frame.
fn reparent_orphan(node: &Node, removed: &BTreeSet<String>, nodes: &[Node]) -> Node {
    let mut node = node.clone();
    // bounded walk, a malformed snapshot may carry parent cycles
    for _ in 0..nodes.len() {
        let Some(parent) = node
            .parent_id
            .as_deref()
            .filter(|p| removed.contains(*p))
            .and_then(|p| nodes.iter().find(|n| n.id == p))
        else {
            break;
        };
        debug!("Rebasing {} out of removed container {}", node.id, parent.id);
        node.position = parent.position + node.position;
        node.parent_id = parent.parent_id.clone();
    }
    if node.parent_id.as_deref().is_some_and(|p| removed.contains(p)) {
        node.parent_id = None;
    }
    node
}

/// Flip the `locked` flag on exactly the target node; draggability follows it.
pub fn toggle_lock(store: &mut TopologyStore, id: &str) -> bool {
    if !store.contains_node(id) {
        warn!("Ignoring lock toggle of unknown node {}", id);
        return false;
    }

    let nodes = store
        .nodes()
        .iter()
        .map(|n| {
            let mut n = n.clone();
            if n.id == id {
                n.locked = !n.locked;
                n.draggable = !n.locked;
            }
            n
        })
        .collect();
    store.set_nodes(nodes);
    true
}

/// Detach children from their container, rebasing positions to absolute.
///
/// On a container this releases every child. On a contained node it releases
/// only that node. Must run before the container's own geometry changes.
pub fn detach(store: &mut TopologyStore, id: &str) -> bool {
    let Some(target) = store.node(id) else {
        warn!("Ignoring detach of unknown node {}", id);
        return false;
    };

    let (container_id, only) = if target.is_container() {
        (target.id.clone(), None)
    } else if let Some(parent_id) = &target.parent_id {
        (parent_id.clone(), Some(target.id.clone()))
    } else {
        debug!("Node {} has no parent, nothing to detach", id);
        return false;
    };

    let Some(origin) = store.node(&container_id).map(|c| c.position) else {
        warn!("Parent {} of {} is missing, nothing to rebase against", container_id, id);
        return false;
    };

    let mut changed = false;
    let nodes = store
        .nodes()
        .iter()
        .map(|n| {
            let mut n = n.clone();
            let selected = only.as_ref().map_or(true, |only| *only == n.id);
            if selected && n.parent_id.as_deref() == Some(container_id.as_str()) {
                n.position = origin + n.position;
                n.parent_id = None;
                changed = true;
            }
            n
        })
        .collect();

    if changed {
        store.set_nodes(nodes);
    }
    changed
}
