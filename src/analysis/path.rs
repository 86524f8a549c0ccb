//! Connectivity graph and shortest path search.
//!
//! Links are undirected. Neighbors are enumerated in edge-list order, so for a
//! fixed edge list the BFS tie-break among equal-length paths is deterministic.

use std::collections::{HashMap, HashSet, VecDeque};

use log::debug;
use serde::Serialize;

use crate::topology::types::Edge;

/// A path through the topology: node ids and the edge ids between them
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Route {
    pub nodes: Vec<String>,
    pub edges: Vec<String>,
}

impl Route {
    pub fn hops(&self) -> usize {
        self.edges.len()
    }
}

/// Node id -> (neighbor id, edge id), in edge-list order
pub fn build_adjacency(edges: &[Edge]) -> HashMap<&str, Vec<(&str, &str)>> {
    let mut adjacency: HashMap<&str, Vec<(&str, &str)>> = HashMap::new();
    for edge in edges {
        if edge.source == edge.target {
            continue;
        }
        adjacency
            .entry(edge.source.as_str())
            .or_default()
            .push((edge.target.as_str(), edge.id.as_str()));
        adjacency
            .entry(edge.target.as_str())
            .or_default()
            .push((edge.source.as_str(), edge.id.as_str()));
    }
    adjacency
}

/// Breadth-first search from `source` to `target`.
///
/// Returns the first path discovered, which is minimal by hop count, or `None`
/// once the frontier is exhausted. `source == target` yields a single-node route.
pub fn find_route(source: &str, target: &str, edges: &[Edge]) -> Option<Route> {
    if source == target {
        return Some(Route {
            nodes: vec![source.to_string()],
            edges: Vec::new(),
        });
    }

    let adjacency = build_adjacency(edges);
    let mut visited: HashSet<&str> = HashSet::from([source]);
    let mut came_from: HashMap<&str, (&str, &str)> = HashMap::new();
    let mut queue: VecDeque<&str> = VecDeque::from([source]);

    while let Some(current) = queue.pop_front() {
        let Some(neighbors) = adjacency.get(current) else {
            continue;
        };
        for &(next, edge_id) in neighbors {
            if !visited.insert(next) {
                continue;
            }
            came_from.insert(next, (current, edge_id));
            if next == target {
                let route = unwind(&came_from, source, target);
                debug!("Route {} -> {}: {} hop(s)", source, target, route.hops());
                return Some(route);
            }
            queue.push_back(next);
        }
    }

    debug!("No route from {} to {}", source, target);
    None
}

fn unwind(came_from: &HashMap<&str, (&str, &str)>, source: &str, target: &str) -> Route {
    let mut nodes = vec![target.to_string()];
    let mut edges = Vec::new();
    let mut current = target;
    while current != source {
        let Some(&(previous, edge_id)) = came_from.get(current) else {
            break;
        };
        edges.push(edge_id.to_string());
        nodes.push(previous.to_string());
        current = previous;
    }
    nodes.reverse();
    edges.reverse();
    Route { nodes, edges }
}

/// Node sequence of the shortest path, if any
pub fn shortest_path(source: &str, target: &str, edges: &[Edge]) -> Option<Vec<String>> {
    find_route(source, target, edges).map(|route| route.nodes)
}
