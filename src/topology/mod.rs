//! Network topology module.
//!
//! This module contains the topology data model and everything that mutates
//! it structurally: the store, id allocation, cascading deletes/locks/detaches,
//! undo history and the device connection rules.

pub mod cascade;
pub mod connections;
pub mod history;
pub mod ids;
pub mod store;
pub mod types;

// Re-export key types and functions for easier access
pub use cascade::resolve_cascade_set;
pub use connections::{ConnectError, LinkOptions};
pub use history::History;
pub use store::{SnapshotError, TopologyStore};
pub use types::{
    Bandwidth, DeviceRole, Edge, LinkMedium, Node, NodeKind, Position, Size, Snapshot,
};
