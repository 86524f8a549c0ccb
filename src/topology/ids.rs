//! Node and edge id allocation.
//!
//! Interactive creation uses timestamp + random suffix ids. The generator uses
//! sequential `-g{n}` ids whose counter is seeded by scanning existing ids, so
//! generation stays a pure function of the existing state.

use std::sync::LazyLock;

use rand::Rng;
use regex::Regex;
use thiserror::Error;

use super::types::{DeviceRole, Edge, Node, NodeKind};

/// Id prefix of generated and interactive links
pub const EDGE_PREFIX: &str = "link";

static GENERATED_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-g(\d+)$").expect("Invalid generated id regex"));

/// Stable type-tag prefix for a node of the given kind and role
pub fn node_prefix(kind: NodeKind, role: Option<DeviceRole>) -> &'static str {
    match kind {
        NodeKind::Device => role.map_or("device", |r| r.id_prefix()),
        NodeKind::Group => "group",
        NodeKind::InfraBox => "infra",
        NodeKind::Annotation => "note",
    }
}

/// Collision-resistant id for interactive creation.
///
/// Format: `{prefix}-{unix millis}-{4 hex digits}`, retried while `is_live`
/// reports the candidate as taken.
pub fn fresh_id(prefix: &str, is_live: impl Fn(&str) -> bool) -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    let mut rng = rand::thread_rng();
    loop {
        let candidate = format!("{}-{}-{:04x}", prefix, millis, rng.gen::<u16>());
        if !is_live(&candidate) {
            return candidate;
        }
    }
}

/// The `-g{n}` counter ran past `u64::MAX`
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Generated id counter exhausted after {prefix}-g{last}", last = u64::MAX)]
pub struct IdsExhausted {
    pub prefix: String,
}

/// Sequential id source for the generator
#[derive(Debug, Clone)]
pub struct IdAllocator {
    /// `None` once the counter has handed out `u64::MAX`
    next: Option<u64>,
}

impl IdAllocator {
    /// Start after the highest `-g{n}` suffix found among existing ids
    pub fn seeded_from(nodes: &[Node], edges: &[Edge]) -> Self {
        let highest = nodes
            .iter()
            .map(|n| n.id.as_str())
            .chain(edges.iter().map(|e| e.id.as_str()))
            .filter_map(|id| GENERATED_SUFFIX.captures(id))
            .filter_map(|caps| caps[1].parse::<u64>().ok())
            .max()
            .unwrap_or(0);
        Self { next: highest.checked_add(1) }
    }

    pub fn next(&mut self, prefix: &str) -> Result<String, IdsExhausted> {
        let n = self.next.ok_or_else(|| IdsExhausted { prefix: prefix.to_string() })?;
        self.next = n.checked_add(1);
        Ok(format!("{}-g{}", prefix, n))
    }
}
