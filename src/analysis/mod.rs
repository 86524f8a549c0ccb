//! Graph analysis over the topology.
//!
//! This module provides the on-demand algorithms: shortest path search,
//! the simulated ping policy and sub-network view scoping. None of them
//! mutate structure.

pub mod path;
pub mod reachability;
pub mod scope;

pub use path::{find_route, shortest_path, Route};
pub use reachability::{simulate_ping, PingOutcome, PingVerdict};
pub use scope::{apply_scope, compute_visibility, Visibility};
