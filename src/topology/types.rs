//! Topology type definitions.
//!
//! This file contains the node, edge and snapshot types shared by every
//! other module, plus the role classification helpers the algorithms branch on.

use std::fmt;
use std::ops::Add;

use serde::{Deserialize, Serialize};

/// Structural kind of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeKind {
    /// A network device (router, switch, host, ...)
    #[default]
    Device,
    /// A sub-network grouping box
    Group,
    /// An infrastructure boundary box
    InfraBox,
    /// Free-form text on the canvas
    Annotation,
}

impl NodeKind {
    /// Returns true for kinds that own the coordinate frame of child nodes
    pub fn is_container(&self) -> bool {
        matches!(self, Self::Group | Self::InfraBox)
    }
}

/// Role of a device node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceRole {
    Router,
    L3Switch,
    Switch,
    Pc,
    Server,
    Firewall,
    Cloud,
}

impl DeviceRole {
    pub const ALL: [DeviceRole; 7] = [
        Self::Router,
        Self::L3Switch,
        Self::Switch,
        Self::Pc,
        Self::Server,
        Self::Firewall,
        Self::Cloud,
    ];

    /// Id prefix used when creating a node of this role
    pub fn id_prefix(&self) -> &'static str {
        match self {
            Self::Router => "router",
            Self::L3Switch => "l3switch",
            Self::Switch => "switch",
            Self::Pc => "pc",
            Self::Server => "server",
            Self::Firewall => "firewall",
            Self::Cloud => "cloud",
        }
    }

    /// Label given to a freshly created device of this role
    pub fn default_label(&self) -> &'static str {
        match self {
            Self::Router => "Router",
            Self::L3Switch => "L3 Switch",
            Self::Switch => "Switch",
            Self::Pc => "PC",
            Self::Server => "Server",
            Self::Firewall => "Firewall",
            Self::Cloud => "Cloud (Internet)",
        }
    }

    /// End hosts: PCs and servers
    pub fn is_host(&self) -> bool {
        matches!(self, Self::Pc | Self::Server)
    }

    /// Plain layer-2 switches. These cascade upward into their group on delete.
    pub fn is_switch_class(&self) -> bool {
        matches!(self, Self::Switch)
    }

    /// Devices allowed to route between VLANs
    pub fn is_router_class(&self) -> bool {
        matches!(self, Self::Router | Self::L3Switch)
    }

    /// Anything that forwards frames for hosts, i.e. a valid `network` attachment point
    pub fn is_switching(&self) -> bool {
        matches!(self, Self::Switch | Self::L3Switch)
    }

    /// Perimeter devices that stay visible in every scope
    pub fn is_infrastructure(&self) -> bool {
        matches!(self, Self::Firewall | Self::Cloud)
    }
}

impl fmt::Display for DeviceRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Router => "router",
            Self::L3Switch => "layer-3 switch",
            Self::Switch => "switch",
            Self::Pc => "PC",
            Self::Server => "server",
            Self::Firewall => "firewall",
            Self::Cloud => "cloud",
        };
        f.write_str(name)
    }
}

/// Canvas position. Children of a container are relative to it.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl Add for Position {
    type Output = Position;

    fn add(self, rhs: Position) -> Position {
        Position::new(self.x + rhs.x, self.y + rhs.y)
    }
}

/// Container dimensions
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// A vertex in the topology.
///
/// The label is multi-line: the first line is the name, later lines carry
/// attributes such as `IP: 192.168.10.10/24` or `(DHCP)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Node {
    pub id: String,
    pub kind: NodeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<DeviceRole>,
    pub label: String,
    pub position: Position,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<Size>,
    /// Container owning this node's coordinate frame
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    /// Switch or group a host is logically attached to (non-owning)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
    pub locked: bool,
    pub draggable: bool,
    pub z_index: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip)]
    pub hidden: bool,
    #[serde(skip)]
    pub focused: bool,
}

impl Default for Node {
    fn default() -> Self {
        Self {
            id: String::new(),
            kind: NodeKind::Device,
            role: None,
            label: String::new(),
            position: Position::default(),
            size: None,
            parent_id: None,
            network: None,
            locked: false,
            draggable: true,
            z_index: 0,
            color: None,
            hidden: false,
            focused: false,
        }
    }
}

impl Node {
    /// Create a device node
    pub fn device(id: impl Into<String>, role: DeviceRole, label: impl Into<String>, position: Position) -> Self {
        Self {
            id: id.into(),
            kind: NodeKind::Device,
            role: Some(role),
            label: label.into(),
            position,
            ..Self::default()
        }
    }

    /// Create a container (group or infrastructure box)
    pub fn container(
        id: impl Into<String>,
        kind: NodeKind,
        label: impl Into<String>,
        position: Position,
        size: Size,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            label: label.into(),
            position,
            size: Some(size),
            ..Self::default()
        }
    }

    /// First label line
    pub fn title(&self) -> &str {
        self.label.lines().next().unwrap_or("").trim()
    }

    pub fn is_container(&self) -> bool {
        self.kind.is_container()
    }

    pub fn has_role(&self, predicate: impl Fn(&DeviceRole) -> bool) -> bool {
        self.kind == NodeKind::Device && self.role.as_ref().is_some_and(predicate)
    }

    pub fn is_host(&self) -> bool {
        self.has_role(DeviceRole::is_host)
    }

    pub fn is_server(&self) -> bool {
        self.has_role(|r| *r == DeviceRole::Server)
    }

    pub fn is_switch_class(&self) -> bool {
        self.has_role(DeviceRole::is_switch_class)
    }

    pub fn is_router_class(&self) -> bool {
        self.has_role(DeviceRole::is_router_class)
    }

    /// Bottom edge in absolute coordinates, for top-level containers
    pub fn bottom(&self) -> f64 {
        self.position.y + self.size.map_or(0.0, |s| s.height)
    }
}

/// Physical medium of a link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LinkMedium {
    #[default]
    Copper,
    Fiber,
    Console,
}

/// Bandwidth class of a link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Bandwidth {
    #[serde(rename = "100M")]
    Fast,
    #[default]
    #[serde(rename = "1G")]
    Gigabit,
    #[serde(rename = "10G")]
    TenGigabit,
}

/// An undirected link between two nodes. `source`/`target` carry no direction.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Edge {
    pub id: String,
    pub source: String,
    pub target: String,
    pub medium: LinkMedium,
    pub bandwidth: Bandwidth,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_port: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_port: Option<String>,
    /// VLAN tag. Absent or blank means untagged.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vlan: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vlan_color: Option<String>,
    #[serde(skip)]
    pub hidden: bool,
}

impl Edge {
    pub fn new(id: impl Into<String>, source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            ..Self::default()
        }
    }

    /// Builder-style VLAN tagging; also assigns the palette colour
    pub fn with_vlan(mut self, vlan: impl Into<String>) -> Self {
        self.set_vlan(Some(vlan.into()));
        self
    }

    pub fn set_vlan(&mut self, vlan: Option<String>) {
        let vlan = vlan.map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        self.vlan_color = vlan.as_deref().map(vlan_color);
        self.vlan = vlan;
    }

    /// Non-empty VLAN tag, if any
    pub fn vlan_tag(&self) -> Option<&str> {
        self.vlan.as_deref().map(str::trim).filter(|v| !v.is_empty())
    }

    pub fn touches(&self, node_id: &str) -> bool {
        self.source == node_id || self.target == node_id
    }

    /// The endpoint opposite to `node_id`
    pub fn other_end(&self, node_id: &str) -> Option<&str> {
        if self.source == node_id {
            Some(&self.target)
        } else if self.target == node_id {
            Some(&self.source)
        } else {
            None
        }
    }

    /// Port label on the `node_id` side
    pub fn port_on(&self, node_id: &str) -> Option<&str> {
        if self.source == node_id {
            self.source_port.as_deref()
        } else if self.target == node_id {
            self.target_port.as_deref()
        } else {
            None
        }
    }
}

const VLAN_PALETTE: [&str; 8] = [
    "#2563eb", "#16a34a", "#f97316", "#9333ea", "#dc2626", "#0891b2", "#ca8a04", "#db2777",
];

/// Display colour for a VLAN tag. Numeric tags map by value, others by byte sum.
pub fn vlan_color(vlan: &str) -> String {
    let key = match vlan.trim().parse::<u32>() {
        Ok(n) => n as usize / 10 + n as usize,
        Err(_) => vlan.bytes().map(usize::from).sum(),
    };
    VLAN_PALETTE[key % VLAN_PALETTE.len()].to_string()
}

/// An immutable (nodes, edges) pair, also the serialized load/save format
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
}

impl Snapshot {
    pub fn new(nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        Self { nodes, edges }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }
}
