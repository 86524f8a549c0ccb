//! Placement constants and accumulators for generated topologies.
//!
//! LAN groups stack downward in the left column, DMZ groups in the right one.
//! The core device sits between the columns with its uplink chain above it.

use crate::topology::types::{Node, NodeKind, Position, Size};

pub const CENTRAL_POSITION: Position = Position::new(400.0, 0.0);
pub const FIREWALL_OFFSET_Y: f64 = -130.0;
pub const CLOUD_OFFSET_Y: f64 = -260.0;

pub const LAN_COLUMN_X: f64 = 0.0;
pub const DMZ_COLUMN_X: f64 = 800.0;
pub const FIRST_ROW_Y: f64 = 160.0;
pub const ROW_GAP: f64 = 40.0;

pub const GROUP_WIDTH: f64 = 320.0;
pub const GROUP_HEIGHT_BARE: f64 = 120.0;
pub const GROUP_HEIGHT_WITH_HOSTS: f64 = 260.0;

// Offsets relative to the owning group
pub const SWITCH_OFFSET: Position = Position::new(110.0, 30.0);
pub const LAN_HOST_OFFSETS: [Position; 2] = [Position::new(20.0, 150.0), Position::new(190.0, 150.0)];
pub const SERVER_OFFSET: Position = Position::new(110.0, 150.0);

pub const INFRA_PADDING: f64 = 40.0;

pub fn group_size(with_hosts: bool) -> Size {
    let height = if with_hosts {
        GROUP_HEIGHT_WITH_HOSTS
    } else {
        GROUP_HEIGHT_BARE
    };
    Size::new(GROUP_WIDTH, height)
}

/// Lowest free row below every existing top-level group, or the first row on
/// an empty canvas
pub fn first_free_row(nodes: &[Node]) -> f64 {
    nodes
        .iter()
        .filter(|n| n.kind == NodeKind::Group && n.parent_id.is_none())
        .map(Node::bottom)
        .reduce(f64::max)
        .map_or(FIRST_ROW_Y, |bottom| bottom + ROW_GAP)
}

/// Y accumulator for one column
#[derive(Debug, Clone)]
pub struct ColumnCursor {
    x: f64,
    next_y: f64,
}

impl ColumnCursor {
    pub fn new(x: f64, start_y: f64) -> Self {
        Self { x, next_y: start_y }
    }

    /// Position for the next block of `height`, advancing the cursor
    pub fn place(&mut self, height: f64) -> Position {
        let position = Position::new(self.x, self.next_y);
        self.next_y += height + ROW_GAP;
        position
    }
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Position,
    pub max: Position,
}

impl Bounds {
    /// Box around the given containers, `None` when there are none
    pub fn around<'a>(nodes: impl IntoIterator<Item = &'a Node>) -> Option<Self> {
        nodes.into_iter().fold(None, |acc: Option<Bounds>, node| {
            let size = node.size.unwrap_or_default();
            let node_min = node.position;
            let node_max = Position::new(node.position.x + size.width, node.position.y + size.height);
            Some(match acc {
                None => Bounds { min: node_min, max: node_max },
                Some(b) => Bounds {
                    min: Position::new(b.min.x.min(node_min.x), b.min.y.min(node_min.y)),
                    max: Position::new(b.max.x.max(node_max.x), b.max.y.max(node_max.y)),
                },
            })
        })
    }

    pub fn padded(self, padding: f64) -> Self {
        Self {
            min: Position::new(self.min.x - padding, self.min.y - padding),
            max: Position::new(self.max.x + padding, self.max.y + padding),
        }
    }

    pub fn size(&self) -> Size {
        Size::new(self.max.x - self.min.x, self.max.y - self.min.y)
    }
}
