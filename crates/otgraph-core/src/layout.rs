//! # Layout Module
//!
//! Read-only projection of the topology into a Purdue-level diagram.
//!
//! - Rows follow the fixed level order 0, 1, 2, 3, DMZ, 4, 5
//! - Row `r` sits at `y = r · LEVEL_SPACING`
//! - Nodes of one row are spread symmetrically around `x = 0`,
//!   `NODE_SPACING` apart, in device-id order
//!
//! Output is raw structure only; rendering is the caller's concern.

use crate::primitives::{LEVEL_SPACING, NODE_SPACING};
use crate::topology::Topology;
use crate::{
    ConnectionId, ConnectionType, Device, DeviceId, DeviceStatus, DeviceType, PurdueLevel,
    SecurityZone,
};
use serde::{Deserialize, Serialize};

/// Position of a node in layout units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub x: i64,
    pub y: i64,
}

/// A device as a diagram node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: DeviceId,
    pub label: String,
    pub device_type: DeviceType,
    pub purdue_level: PurdueLevel,
    pub security_zone: SecurityZone,
    pub status: DeviceStatus,
    pub position: Position,
}

/// A connection as a diagram edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub id: ConnectionId,
    pub source: DeviceId,
    pub target: DeviceId,
    pub connection_type: ConnectionType,
    pub protocol: Option<String>,
    pub secure: bool,
}

/// One Purdue row of the diagram.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelGroup {
    pub level: PurdueLevel,
    pub label: String,
    pub y: i64,
    pub devices: Vec<DeviceId>,
}

/// Complete diagram of the topology.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TopologyView {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
    /// Only levels holding at least one device, in layout order.
    pub levels: Vec<LevelGroup>,
}

/// Horizontal offset of slot `index` among `count` nodes.
///
/// `(2i + 1 − n) · spacing / 2`: symmetric around zero for any `n`.
#[must_use]
pub fn slot_x(index: usize, count: usize) -> i64 {
    let doubled = 2 * index as i64 + 1 - count as i64;
    doubled * NODE_SPACING / 2
}

/// Vertical offset of a level row.
#[must_use]
pub fn row_y(level: PurdueLevel) -> i64 {
    level.layout_row() as i64 * LEVEL_SPACING
}

fn node_for(device: &Device, position: Position) -> GraphNode {
    GraphNode {
        id: device.id,
        label: device.name.clone(),
        device_type: device.device_type,
        purdue_level: device.purdue_level,
        security_zone: device.security_zone,
        status: device.status,
        position,
    }
}

/// Project the topology into a laid-out diagram.
#[must_use]
pub fn build_graph(topology: &Topology) -> TopologyView {
    let mut view = TopologyView::default();

    for level in PurdueLevel::ORDER {
        let row: Vec<&Device> = topology
            .devices()
            .filter(|d| d.purdue_level == level)
            .collect();
        if row.is_empty() {
            continue;
        }

        let y = row_y(level);
        for (index, device) in row.iter().enumerate() {
            let position = Position {
                x: slot_x(index, row.len()),
                y,
            };
            view.nodes.push(node_for(device, position));
        }

        view.levels.push(LevelGroup {
            level,
            label: level.label().to_string(),
            y,
            devices: row.iter().map(|d| d.id).collect(),
        });
    }

    view.edges = topology
        .connections()
        .map(|c| GraphEdge {
            id: c.id,
            source: c.source_id,
            target: c.target_id,
            connection_type: c.connection_type,
            protocol: c.protocol.clone(),
            secure: c.secure,
        })
        .collect();

    view
}
