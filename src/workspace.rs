//! Topology workspace.
//!
//! [`Workspace`] is the mutation interface presentation layers talk to. It
//! owns the store, the undo history, the current focus and the last address
//! validation result, and exposes every user intent as a plain method.
//!
//! Structural mutations follow the same sequence: mutate the store, push one
//! history snapshot, then recompute view scoping. Operations on stale ids are
//! no-ops that return `false`.

use std::collections::BTreeMap;
use std::path::Path;

use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use log::{debug, info, warn};

use crate::analysis::reachability::{simulate_ping, PingOutcome};
use crate::analysis::scope::apply_scope;
use crate::config::GeneratorConfig;
use crate::export::{all_device_interfaces, device_interfaces, DeviceInterfaces};
use crate::generator::{generate, GenerateError, GenerationReport};
use crate::topology::cascade;
use crate::topology::connections::{self, ConnectError, LinkOptions};
use crate::topology::history::History;
use crate::topology::ids::{fresh_id, node_prefix, EDGE_PREFIX};
use crate::topology::store::{parse_snapshot, TopologyStore};
use crate::topology::types::{Bandwidth, DeviceRole, Edge, LinkMedium, Node, NodeKind, Position, Size, Snapshot};
use crate::utils::validation::validate_addresses;

const DEFAULT_GROUP_SIZE: Size = Size::new(320.0, 260.0);
const DEFAULT_INFRA_SIZE: Size = Size::new(640.0, 480.0);

/// A node to be created. Id, default label and default size are filled in
/// by [`Workspace::create_node`].
#[derive(Debug, Clone)]
pub struct NodeDraft {
    pub kind: NodeKind,
    pub role: Option<DeviceRole>,
    pub label: Option<String>,
    pub position: Position,
    pub size: Option<Size>,
    pub parent_id: Option<String>,
}

impl NodeDraft {
    /// A device from the palette
    pub fn device(role: DeviceRole, position: Position) -> Self {
        Self {
            kind: NodeKind::Device,
            role: Some(role),
            label: None,
            position,
            size: None,
            parent_id: None,
        }
    }

    /// A group or infrastructure box
    pub fn container(kind: NodeKind, position: Position) -> Self {
        Self {
            kind,
            role: None,
            label: None,
            position,
            size: None,
            parent_id: None,
        }
    }

    pub fn annotation(text: impl Into<String>, position: Position) -> Self {
        Self {
            label: Some(text.into()),
            ..Self::container(NodeKind::Annotation, position)
        }
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn size(mut self, size: Size) -> Self {
        self.size = Some(size);
        self
    }

    /// Place inside a container; the position becomes relative to it
    pub fn inside(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    fn default_label(&self) -> &'static str {
        match (self.kind, self.role) {
            (NodeKind::Device, Some(role)) => role.default_label(),
            (NodeKind::Device, None) => "Device",
            (NodeKind::Group, _) => "Network",
            (NodeKind::InfraBox, _) => "Infrastructure Zone",
            (NodeKind::Annotation, _) => "Note",
        }
    }

    fn default_size(&self) -> Option<Size> {
        match self.kind {
            NodeKind::Group => Some(DEFAULT_GROUP_SIZE),
            NodeKind::InfraBox => Some(DEFAULT_INFRA_SIZE),
            NodeKind::Device | NodeKind::Annotation => None,
        }
    }
}

/// Attribute changes for an existing link. `None` leaves a field alone; a
/// blank `vlan` removes the tag.
#[derive(Debug, Clone, Default)]
pub struct EdgeUpdate {
    pub medium: Option<LinkMedium>,
    pub bandwidth: Option<Bandwidth>,
    pub source_port: Option<String>,
    pub target_port: Option<String>,
    pub vlan: Option<String>,
}

/// Store + history + view state
#[derive(Debug)]
pub struct Workspace {
    store: TopologyStore,
    history: History,
    focus: Option<String>,
    show_hosts: bool,
    warnings: BTreeMap<String, String>,
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new()
    }
}

impl Workspace {
    /// Empty workspace; the empty topology is the first history entry
    pub fn new() -> Self {
        Self::from_snapshot(Snapshot::default())
    }

    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        let store = TopologyStore::from_snapshot(snapshot);
        let mut history = History::default();
        history.push(store.snapshot());
        let mut workspace = Self {
            store,
            history,
            focus: None,
            show_hosts: true,
            warnings: BTreeMap::new(),
        };
        workspace.refresh_scope();
        workspace
    }

    pub fn store(&self) -> &TopologyStore {
        &self.store
    }

    pub fn nodes(&self) -> &[Node] {
        self.store.nodes()
    }

    pub fn edges(&self) -> &[Edge] {
        self.store.edges()
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.store.node(id)
    }

    pub fn edge(&self, id: &str) -> Option<&Edge> {
        self.store.edge(id)
    }

    pub fn focus(&self) -> Option<&str> {
        self.focus.as_deref()
    }

    pub fn show_hosts(&self) -> bool {
        self.show_hosts
    }

    /// Result of the last [`Workspace::validate`] run
    pub fn warnings(&self) -> &BTreeMap<String, String> {
        &self.warnings
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn snapshot(&self) -> Snapshot {
        self.store.snapshot()
    }

    /// Record the current state and bring the view flags up to date
    fn commit(&mut self) {
        self.history.push(self.store.snapshot());
        if self.focus.as_deref().is_some_and(|f| !self.store.contains_node(f)) {
            debug!("Focused node is gone, returning to the global scope");
            self.focus = None;
        }
        self.warnings.retain(|id, _| self.store.contains_node(id));
        self.refresh_scope();
    }

    /// Add a node and return its id
    pub fn create_node(&mut self, draft: NodeDraft) -> String {
        let prefix = node_prefix(draft.kind, draft.role);
        let id = fresh_id(prefix, |candidate| self.store.is_live(candidate));

        let parent_id = match draft.parent_id.as_deref() {
            Some(parent) if self.store.node(parent).is_some_and(Node::is_container) => Some(parent.to_string()),
            Some(parent) => {
                warn!("Ignoring parent {} of new node {}: not a container", parent, id);
                None
            }
            None => None,
        };
        let node = Node {
            id: id.clone(),
            kind: draft.kind,
            role: draft.role.filter(|_| draft.kind == NodeKind::Device),
            label: draft.label.clone().unwrap_or_else(|| draft.default_label().to_string()),
            position: draft.position,
            size: draft.size.or_else(|| draft.default_size()),
            parent_id,
            ..Node::default()
        };

        debug!("Creating node {}", id);
        let mut nodes = self.store.nodes().to_vec();
        nodes.push(node);
        self.store.set_nodes(nodes);
        self.commit();
        id
    }

    /// Link two devices. Rejected pairings leave everything unchanged.
    pub fn connect(&mut self, source: &str, target: &str, options: LinkOptions) -> Result<String, ConnectError> {
        let edge_id = fresh_id(EDGE_PREFIX, |candidate| self.store.is_live(candidate));
        let id = connections::connect(&mut self.store, source, target, options, edge_id)?;
        self.commit();
        Ok(id)
    }

    /// Delete a node or edge together with its cascade closure
    pub fn delete(&mut self, id: &str) -> bool {
        if !cascade::delete(&mut self.store, id) {
            return false;
        }
        self.commit();
        true
    }

    pub fn toggle_lock(&mut self, id: &str) -> bool {
        if !cascade::toggle_lock(&mut self.store, id) {
            return false;
        }
        self.commit();
        true
    }

    pub fn detach(&mut self, id: &str) -> bool {
        if !cascade::detach(&mut self.store, id) {
            return false;
        }
        self.commit();
        true
    }

    fn edit_node(&mut self, id: &str, edit: impl FnOnce(&mut Node)) -> bool {
        if !self.store.contains_node(id) {
            warn!("Ignoring edit of unknown node {}", id);
            return false;
        }
        let mut edit = Some(edit);
        let nodes = self
            .store
            .nodes()
            .iter()
            .map(|n| {
                let mut n = n.clone();
                if n.id == id {
                    if let Some(edit) = edit.take() {
                        edit(&mut n);
                    }
                }
                n
            })
            .collect();
        self.store.set_nodes(nodes);
        self.commit();
        true
    }

    pub fn set_label(&mut self, id: &str, label: impl Into<String>) -> bool {
        let label = label.into();
        self.edit_node(id, |n| n.label = label)
    }

    pub fn set_color(&mut self, id: &str, color: Option<String>) -> bool {
        self.edit_node(id, |n| n.color = color)
    }

    /// Move a node. Locked nodes stay put.
    pub fn move_node(&mut self, id: &str, position: Position) -> bool {
        if self.store.node(id).is_some_and(|n| n.locked) {
            debug!("Node {} is locked, not moving it", id);
            return false;
        }
        self.edit_node(id, |n| n.position = position)
    }

    pub fn update_edge(&mut self, id: &str, update: EdgeUpdate) -> bool {
        if self.store.edge(id).is_none() {
            warn!("Ignoring edit of unknown link {}", id);
            return false;
        }
        let edges = self
            .store
            .edges()
            .iter()
            .map(|e| {
                let mut e = e.clone();
                if e.id == id {
                    if let Some(medium) = update.medium {
                        e.medium = medium;
                    }
                    if let Some(bandwidth) = update.bandwidth {
                        e.bandwidth = bandwidth;
                    }
                    if let Some(port) = &update.source_port {
                        e.source_port = Some(port.clone());
                    }
                    if let Some(port) = &update.target_port {
                        e.target_port = Some(port.clone());
                    }
                    if let Some(vlan) = &update.vlan {
                        e.set_vlan(Some(vlan.clone()));
                    }
                }
                e
            })
            .collect();
        self.store.set_edges(edges);
        self.commit();
        true
    }

    /// Enter a sub-network (`Some`) or return to the global scope (`None`).
    /// Focusing an unknown id is a no-op.
    pub fn set_focus(&mut self, focus: Option<&str>) -> bool {
        if let Some(id) = focus {
            if !self.store.contains_node(id) {
                warn!("Ignoring focus on unknown node {}", id);
                return false;
            }
        }
        self.focus = focus.map(str::to_string);
        self.refresh_scope();
        true
    }

    pub fn set_show_hosts(&mut self, show_hosts: bool) {
        self.show_hosts = show_hosts;
        self.refresh_scope();
    }

    /// Recompute visibility flags. Returns whether any flag changed.
    pub fn refresh_scope(&mut self) -> bool {
        apply_scope(&mut self.store, self.focus.as_deref(), self.show_hosts)
    }

    pub fn ping(&self, source: &str, target: &str) -> PingOutcome {
        simulate_ping(source, target, self.store.nodes(), self.store.edges())
    }

    /// Full address re-scan; replaces the previous warnings
    pub fn validate(&mut self) -> &BTreeMap<String, String> {
        self.warnings = validate_addresses(self.store.nodes());
        &self.warnings
    }

    /// Run the generator. On error the topology is left as it was.
    pub fn generate(&mut self, config: &GeneratorConfig, append: bool) -> Result<GenerationReport, GenerateError> {
        let (snapshot, report) = generate(&self.store.snapshot(), config, append)?;
        self.store.restore(snapshot);
        self.commit();
        Ok(report)
    }

    /// Step back one history entry. Returns false when there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        let Some(previous) = self.history.undo().cloned() else {
            debug!("Nothing to undo");
            return false;
        };
        self.store.restore(previous);
        if self.focus.as_deref().is_some_and(|f| !self.store.contains_node(f)) {
            self.focus = None;
        }
        self.refresh_scope();
        true
    }

    pub fn interfaces(&self, device_id: &str) -> Option<DeviceInterfaces> {
        device_interfaces(self.store.nodes(), self.store.edges(), device_id)
    }

    pub fn all_interfaces(&self) -> Vec<DeviceInterfaces> {
        all_device_interfaces(self.store.nodes(), self.store.edges())
    }

    /// Write the topology as JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = self.store.to_json()?;
        std::fs::write(path, json).wrap_err_with(|| format!("Failed to write topology to {}", path.display()))?;
        info!(
            "Saved {} nodes and {} edges to {}",
            self.store.nodes().len(),
            self.store.edges().len(),
            path.display()
        );
        Ok(())
    }

    /// Load a topology saved with [`Workspace::save`]. History starts over.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read topology from {}", path.display()))?;
        let snapshot = parse_snapshot(&text).wrap_err_with(|| format!("Invalid topology file {}", path.display()))?;
        info!(
            "Loaded {} nodes and {} edges from {}",
            snapshot.nodes.len(),
            snapshot.edges.len(),
            path.display()
        );
        Ok(Self::from_snapshot(snapshot))
    }
}
