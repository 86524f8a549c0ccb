//! Topology store.
//!
//! Owns the canonical node and edge collections. Mutation is by whole-collection
//! replacement only; every replacement bumps a revision counter which plays the
//! role of collection identity for consumers that watch for changes.

use std::collections::HashSet;

use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use super::types::{Edge, Node, Snapshot};

/// Errors raised while reading a serialized snapshot
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("Snapshot is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Snapshot must be a JSON object with `nodes` and `edges`")]
    NotAnObject,
}

/// Canonical node-id -> node and edge-id -> edge mapping
#[derive(Debug, Default, Clone)]
pub struct TopologyStore {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    revision: u64,
}

impl TopologyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from a snapshot, pruning edges whose endpoints are missing
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        let mut store = Self::new();
        store.restore(snapshot);
        store
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn edge(&self, id: &str) -> Option<&Edge> {
        self.edges.iter().find(|e| e.id == id)
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.node(id).is_some()
    }

    /// Whether `id` names a live node or edge
    pub fn is_live(&self, id: &str) -> bool {
        self.contains_node(id) || self.edge(id).is_some()
    }

    /// Replace the whole node collection
    pub fn set_nodes(&mut self, nodes: Vec<Node>) {
        self.nodes = nodes;
        self.revision += 1;
    }

    /// Replace the whole edge collection
    pub fn set_edges(&mut self, edges: Vec<Edge>) {
        self.edges = edges;
        self.revision += 1;
    }

    /// Incremented on every collection replacement
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Edges touching `node_id`, in insertion order
    pub fn incident_edges<'a>(&'a self, node_id: &'a str) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |e| e.touches(node_id))
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::new(self.nodes.clone(), self.edges.clone())
    }

    /// Replace both collections with the snapshot's content
    pub fn restore(&mut self, snapshot: Snapshot) {
        let Snapshot { nodes, edges } = snapshot;
        let edges = prune_dangling_edges(&nodes, edges);
        self.set_nodes(nodes);
        self.set_edges(edges);
    }

    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string_pretty(&self.snapshot())?)
    }

    pub fn from_json(text: &str) -> Result<Self, SnapshotError> {
        Ok(Self::from_snapshot(parse_snapshot(text)?))
    }
}

/// Drop edges referencing node ids absent from `nodes`
pub fn prune_dangling_edges(nodes: &[Node], edges: Vec<Edge>) -> Vec<Edge> {
    let ids: HashSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
    let before = edges.len();
    let kept: Vec<Edge> = edges
        .into_iter()
        .filter(|e| ids.contains(e.source.as_str()) && ids.contains(e.target.as_str()))
        .collect();
    if kept.len() != before {
        warn!("Pruned {} dangling edge(s)", before - kept.len());
    }
    kept
}

/// Parse a serialized snapshot, best effort.
///
/// Missing or non-array `nodes`/`edges` default to empty collections and
/// individual entries that fail to deserialize are dropped. Only input that is
/// not a JSON object at all is rejected.
pub fn parse_snapshot(text: &str) -> Result<Snapshot, SnapshotError> {
    let value: Value = serde_json::from_str(text)?;
    let Value::Object(mut map) = value else {
        return Err(SnapshotError::NotAnObject);
    };

    let nodes = take_entries::<Node>(&mut map, "nodes");
    let edges = take_entries::<Edge>(&mut map, "edges");
    debug!("Parsed snapshot with {} nodes and {} edges", nodes.len(), edges.len());

    Ok(Snapshot::new(nodes, edges))
}

fn take_entries<T: DeserializeOwned>(map: &mut Map<String, Value>, key: &str) -> Vec<T> {
    match map.remove(key) {
        Some(Value::Array(items)) => items
            .into_iter()
            .enumerate()
            .filter_map(|(index, item)| match serde_json::from_value(item) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!("Dropping malformed {} entry #{}: {}", key, index, e);
                    None
                }
            })
            .collect(),
        None | Some(Value::Null) => {
            debug!("Snapshot has no `{}`, defaulting to empty", key);
            Vec::new()
        }
        Some(_) => {
            warn!("Snapshot field `{}` is not a list, defaulting to empty", key);
            Vec::new()
        }
    }
}
