//! Topology generator.
//!
//! Expands a [`GeneratorConfig`] into concrete nodes and edges: a central
//! router (or layer-3 switch), an optional firewall + internet uplink, one
//! group with a switch per network and optionally its end hosts, and an
//! infrastructure box around the generated groups.
//!
//! Generation is a pure function of (existing snapshot, config, append flag).
//! Every counter (ids, VLANs, Y offsets, fallback subnets) is seeded by
//! scanning the existing snapshot and threaded through explicitly.

pub mod layout;

use std::collections::BTreeSet;

use ipnetwork::Ipv4Network;
use log::{debug, info};

use crate::config::{GeneratorConfig, NetworkClass, NetworkSpec, ValidationError, MAX_VLAN_ID};
use crate::ip::allocator::{default_network, host_addresses, AllocationError};
use crate::topology::connections::{connect, ConnectError, LinkOptions};
use crate::topology::ids::{IdAllocator, IdsExhausted, EDGE_PREFIX};
use crate::topology::store::TopologyStore;
use crate::topology::types::{DeviceRole, Edge, LinkMedium, Node, NodeKind, Position, Snapshot};

use layout::{Bounds, ColumnCursor};

const LAN_GROUP_COLOR: &str = "#22c55e";
const DMZ_GROUP_COLOR: &str = "#f97316";
const VLAN_STEP: u16 = 10;

#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error("Cannot address network '{network}': {source}")]
    Addressing {
        network: String,
        #[source]
        source: AllocationError,
    },

    #[error("No free VLAN id left for network '{0}'")]
    VlansExhausted(String),

    #[error("Generated link rejected: {0}")]
    Link(#[from] ConnectError),

    #[error(transparent)]
    Ids(#[from] IdsExhausted),
}

/// What a generation call created
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationReport {
    pub central_id: String,
    /// False when an existing central device was reused
    pub created_central: bool,
    pub groups: Vec<String>,
    pub switches: Vec<String>,
    pub hosts: Vec<String>,
    pub vlans: Vec<u16>,
    pub infrastructure_id: Option<String>,
}

/// Hands out VLAN ids: explicit ones as declared, the rest in steps of ten
/// above everything already in use.
#[derive(Debug)]
struct VlanCounter {
    next: u16,
    used: BTreeSet<u16>,
}

impl VlanCounter {
    fn seeded(edges: &[Edge], config: &GeneratorConfig) -> Self {
        let existing: BTreeSet<u16> = edges
            .iter()
            .filter_map(|e| e.vlan_tag()?.parse::<u16>().ok())
            .collect();
        let next = existing
            .last()
            .map_or(VLAN_STEP, |max| (max / VLAN_STEP + 1).saturating_mul(VLAN_STEP));
        let used = existing
            .into_iter()
            .chain(config.networks.iter().filter_map(|n| n.vlan_id))
            .collect();
        Self { next, used }
    }

    fn assign(&mut self, spec: &NetworkSpec) -> Result<u16, GenerateError> {
        if let Some(vlan) = spec.vlan_id {
            return Ok(vlan);
        }
        while self.used.contains(&self.next) {
            self.next = self.next.saturating_add(VLAN_STEP);
        }
        if self.next > MAX_VLAN_ID {
            return Err(GenerateError::VlansExhausted(spec.name.clone()));
        }
        let vlan = self.next;
        self.used.insert(vlan);
        self.next = self.next.saturating_add(VLAN_STEP);
        Ok(vlan)
    }
}

/// A link to create once all nodes are in place
struct PendingLink {
    source: String,
    target: String,
    options: LinkOptions,
}

impl PendingLink {
    fn new(source: &str, target: &str, options: LinkOptions) -> Self {
        Self {
            source: source.to_string(),
            target: target.to_string(),
            options,
        }
    }
}

/// Mutable state threaded through one generation call
struct Generation<'a> {
    config: &'a GeneratorConfig,
    ids: IdAllocator,
    vlans: VlanCounter,
    next_fallback: usize,
    nodes: Vec<Node>,
    links: Vec<PendingLink>,
    report: GenerationReport,
}

/// Generate a topology from `config`.
///
/// With `append` the result is `existing` plus the new elements, reusing an
/// existing router-class device as the core. Without it `existing` is
/// discarded. Existing elements are never modified.
///
/// # Arguments
/// * `existing` - The current topology
/// * `config` - Validated or unvalidated generation request
/// * `append` - Keep `existing` and stack new groups below it
///
/// # Returns
/// * The resulting full snapshot and a report of the created ids
pub fn generate(
    existing: &Snapshot,
    config: &GeneratorConfig,
    append: bool,
) -> Result<(Snapshot, GenerationReport), GenerateError> {
    config.validate()?;

    let base = if append { existing.clone() } else { Snapshot::default() };
    let existing_groups = base.nodes.iter().filter(|n| n.kind == NodeKind::Group).count();
    let start_y = layout::first_free_row(&base.nodes);

    let mut generation = Generation {
        config,
        ids: IdAllocator::seeded_from(&base.nodes, &base.edges),
        vlans: VlanCounter::seeded(&base.edges, config),
        next_fallback: existing_groups,
        nodes: Vec::new(),
        links: Vec::new(),
        report: GenerationReport::default(),
    };

    let central_id = generation.central_device(&base.nodes)?;

    let mut lan_column = ColumnCursor::new(layout::LAN_COLUMN_X, start_y);
    for spec in config.networks_of(NetworkClass::Lan) {
        generation.network(spec, &central_id, &mut lan_column)?;
    }
    let mut dmz_column = ColumnCursor::new(layout::DMZ_COLUMN_X, start_y);
    for spec in config.networks_of(NetworkClass::Dmz) {
        generation.network(spec, &central_id, &mut dmz_column)?;
    }

    if config.infrastructure.enabled {
        generation.infrastructure_box()?;
    }

    let Generation { mut ids, nodes, links, report, .. } = generation;

    let mut store = TopologyStore::from_snapshot(base);
    let mut all_nodes = store.nodes().to_vec();
    all_nodes.extend(nodes);
    store.set_nodes(all_nodes);
    for link in links {
        connect(&mut store, &link.source, &link.target, link.options, ids.next(EDGE_PREFIX)?)?;
    }

    info!(
        "Generated {} group(s), {} host(s) around {} ({} total nodes, {} links)",
        report.groups.len(),
        report.hosts.len(),
        report.central_id,
        store.nodes().len(),
        store.edges().len()
    );
    Ok((store.snapshot(), report))
}

impl Generation<'_> {
    /// Reuse the first router-class device, or create one with its uplink chain
    fn central_device(&mut self, existing: &[Node]) -> Result<String, GenerateError> {
        if let Some(central) = existing.iter().find(|n| n.is_router_class()) {
            debug!("Reusing central device {}", central.id);
            self.report.central_id = central.id.clone();
            return Ok(central.id.clone());
        }

        let role = self.config.central_device.role();
        let central_id = self.ids.next(role.id_prefix())?;
        let position = layout::CENTRAL_POSITION;
        self.nodes
            .push(Node::device(&central_id, role, role.default_label(), position));

        if self.config.include_uplink {
            let firewall_id = self.ids.next(DeviceRole::Firewall.id_prefix())?;
            let cloud_id = self.ids.next(DeviceRole::Cloud.id_prefix())?;
            self.nodes.push(Node::device(
                &firewall_id,
                DeviceRole::Firewall,
                DeviceRole::Firewall.default_label(),
                Position::new(position.x, position.y + layout::FIREWALL_OFFSET_Y),
            ));
            self.nodes.push(Node::device(
                &cloud_id,
                DeviceRole::Cloud,
                DeviceRole::Cloud.default_label(),
                Position::new(position.x, position.y + layout::CLOUD_OFFSET_Y),
            ));
            let fiber = LinkOptions::default().medium(LinkMedium::Fiber);
            self.links.push(PendingLink::new(&central_id, &firewall_id, fiber.clone()));
            self.links.push(PendingLink::new(&firewall_id, &cloud_id, fiber));
        }

        self.report.central_id = central_id.clone();
        self.report.created_central = true;
        Ok(central_id)
    }

    /// One group with its switch, uplink and optional hosts
    fn network(&mut self, spec: &NetworkSpec, central_id: &str, column: &mut ColumnCursor) -> Result<(), GenerateError> {
        let vlan = self.vlans.assign(spec)?;
        let with_hosts = self.config.auto_hosts;
        let size = layout::group_size(with_hosts);
        let name = spec.name.trim();

        let (prefix_label, color) = match spec.class {
            NetworkClass::Lan => ("LAN", LAN_GROUP_COLOR),
            NetworkClass::Dmz => ("DMZ", DMZ_GROUP_COLOR),
        };
        let group_id = self.ids.next("group")?;
        let mut group = Node::container(
            &group_id,
            NodeKind::Group,
            format!("{} - {}", prefix_label, name),
            column.place(size.height),
            size,
        );
        group.color = Some(color.to_string());
        self.nodes.push(group);

        let declared = spec.cidr();
        let switch_label = match declared {
            Some(net) => format!("SW-{}\n{}/{}", name, net.network(), net.prefix()),
            None => format!("SW-{}", name),
        };
        let switch_id = self.ids.next(DeviceRole::Switch.id_prefix())?;
        let mut switch = Node::device(&switch_id, DeviceRole::Switch, switch_label, layout::SWITCH_OFFSET);
        switch.parent_id = Some(group_id.clone());
        self.nodes.push(switch);
        self.links.push(PendingLink::new(
            &switch_id,
            central_id,
            LinkOptions::default().medium(LinkMedium::Fiber).vlan(vlan.to_string()),
        ));

        if with_hosts {
            let network = match declared {
                Some(net) => net,
                None => self.fallback_network(spec)?,
            };
            self.hosts(spec, network, &group_id, &switch_id)?;
        }

        debug!("Network {} ({}): group {}, VLAN {}", name, spec.class, group_id, vlan);
        self.report.groups.push(group_id);
        self.report.switches.push(switch_id);
        self.report.vlans.push(vlan);
        Ok(())
    }

    fn fallback_network(&mut self, spec: &NetworkSpec) -> Result<Ipv4Network, GenerateError> {
        let network = default_network(self.next_fallback).map_err(|source| GenerateError::Addressing {
            network: spec.name.clone(),
            source,
        })?;
        self.next_fallback += 1;
        Ok(network)
    }

    /// Two PCs for a LAN, one server over fiber for a DMZ
    fn hosts(&mut self, spec: &NetworkSpec, network: Ipv4Network, group_id: &str, switch_id: &str) -> Result<(), GenerateError> {
        let name = spec.name.trim();
        let (role, medium, offsets): (DeviceRole, LinkMedium, &[Position]) = match spec.class {
            NetworkClass::Lan => (DeviceRole::Pc, LinkMedium::Copper, &layout::LAN_HOST_OFFSETS),
            NetworkClass::Dmz => (DeviceRole::Server, LinkMedium::Fiber, std::slice::from_ref(&layout::SERVER_OFFSET)),
        };
        let addresses = host_addresses(network, offsets.len()).map_err(|source| GenerateError::Addressing {
            network: name.to_string(),
            source,
        })?;

        for (k, (offset, addr)) in offsets.iter().zip(addresses).enumerate() {
            let title = match spec.class {
                NetworkClass::Lan => format!("PC-{}-{}", name, k + 1),
                NetworkClass::Dmz => format!("SRV-{}", name),
            };
            let host_id = self.ids.next(role.id_prefix())?;
            let mut host = Node::device(
                &host_id,
                role,
                format!("{}\nIP: {}/{}", title, addr, network.prefix()),
                *offset,
            );
            host.parent_id = Some(group_id.to_string());
            self.nodes.push(host);
            self.links
                .push(PendingLink::new(&host_id, switch_id, LinkOptions::default().medium(medium)));
            self.report.hosts.push(host_id);
        }
        Ok(())
    }

    /// Locked boundary behind the groups created in this call
    fn infrastructure_box(&mut self) -> Result<(), GenerateError> {
        let new_groups = self.nodes.iter().filter(|n| n.kind == NodeKind::Group);
        let Some(bounds) = Bounds::around(new_groups) else {
            return Ok(());
        };
        let bounds = bounds.padded(layout::INFRA_PADDING);

        let infra_id = self.ids.next("infra")?;
        let mut infra = Node::container(
            &infra_id,
            NodeKind::InfraBox,
            self.config.infrastructure.label.clone(),
            bounds.min,
            bounds.size(),
        );
        infra.locked = true;
        infra.draggable = false;
        infra.z_index = -1;
        // first among the new nodes so it renders behind them
        self.nodes.insert(0, infra);
        self.report.infrastructure_id = Some(infra_id);
        Ok(())
    }
}
