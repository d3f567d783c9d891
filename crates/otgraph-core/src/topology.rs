//! # Topology Store
//!
//! The live device/connection graph.
//!
//! Three maps, all `BTreeMap`-backed for deterministic iteration:
//! - device id → `Device`
//! - canonical edge key → `Connection` (at most one per unordered pair)
//! - device id → neighbour set
//!
//! The adjacency map is always the symmetric closure of the connection
//! endpoints. Read-only projections (layout, snapshot, statistics) live in
//! their own modules and never mutate the store.

use crate::layout::{self, TopologyView};
use crate::snapshot::{self, Snapshot};
use crate::stats::TopologyStatistics;
use crate::{Connection, Device, DeviceId, EdgeKey};
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet, VecDeque};

/// Whether `add_connection` stored a new edge or refreshed an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionUpsert {
    Created,
    Updated,
}

/// The topology graph store.
#[derive(Debug, Clone, Default)]
pub struct Topology {
    devices: BTreeMap<DeviceId, Device>,
    connections: BTreeMap<EdgeKey, Connection>,
    adjacency: BTreeMap<DeviceId, BTreeSet<DeviceId>>,
}

impl Topology {
    /// Create an empty topology.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // MUTATION
    // =========================================================================

    /// Insert or replace a device. Idempotent.
    pub fn add_device(&mut self, device: Device) {
        self.adjacency.entry(device.id).or_default();
        self.devices.insert(device.id, device);
    }

    /// Insert or refresh a connection under its canonical key.
    ///
    /// On repeat co-occurrence only `last_seen` (never moving backwards) and,
    /// when supplied, `bandwidth` change. Protocol, port and security fields
    /// keep their first-discovery values.
    pub fn add_connection(&mut self, connection: Connection) -> ConnectionUpsert {
        let key = connection.key();

        if let Some(existing) = self.connections.get_mut(&key) {
            existing.last_seen = existing.last_seen.max(connection.last_seen);
            if connection.bandwidth.is_some() {
                existing.bandwidth = connection.bandwidth;
            }
            return ConnectionUpsert::Updated;
        }

        let (a, b) = (connection.source_id, connection.target_id);
        self.adjacency.entry(a).or_default().insert(b);
        self.adjacency.entry(b).or_default().insert(a);
        self.connections.insert(key, connection);
        ConnectionUpsert::Created
    }

    /// Drop every device, connection and adjacency entry.
    pub fn clear(&mut self) {
        self.devices.clear();
        self.connections.clear();
        self.adjacency.clear();
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    /// Shortest path (by hop count) between two devices, endpoints included.
    ///
    /// Breadth-first over the adjacency map; neighbours are visited in
    /// ascending id order, so ties resolve to the lexicographically smallest
    /// path. Returns `None` for unknown ids or unreachable targets.
    #[must_use]
    pub fn find_path(&self, source: DeviceId, target: DeviceId) -> Option<Vec<DeviceId>> {
        if !self.adjacency.contains_key(&source) || !self.adjacency.contains_key(&target) {
            return None;
        }
        if source == target {
            return Some(vec![source]);
        }

        let mut parents: BTreeMap<DeviceId, DeviceId> = BTreeMap::new();
        let mut visited = BTreeSet::new();
        let mut queue = VecDeque::new();

        visited.insert(source);
        queue.push_back(source);

        while let Some(current) = queue.pop_front() {
            for &next in self.neighbors(current) {
                if !visited.insert(next) {
                    continue;
                }
                parents.insert(next, current);
                if next == target {
                    return Some(Self::unwind(&parents, source, target));
                }
                queue.push_back(next);
            }
        }

        None
    }

    fn unwind(
        parents: &BTreeMap<DeviceId, DeviceId>,
        source: DeviceId,
        target: DeviceId,
    ) -> Vec<DeviceId> {
        let mut path = vec![target];
        let mut current = target;
        while current != source {
            match parents.get(&current) {
                Some(&parent) => {
                    path.push(parent);
                    current = parent;
                }
                None => break,
            }
        }
        path.reverse();
        path
    }

    /// Every connection with `device` as either endpoint, in key order.
    #[must_use]
    pub fn device_connections(&self, device: DeviceId) -> Vec<&Connection> {
        let Some(neighbors) = self.adjacency.get(&device) else {
            return Vec::new();
        };
        neighbors
            .iter()
            .filter_map(|&other| self.connections.get(&EdgeKey::new(device, other)))
            .collect()
    }

    /// Neighbour ids of a device in ascending order.
    pub fn neighbors(&self, device: DeviceId) -> impl Iterator<Item = &DeviceId> {
        self.adjacency.get(&device).into_iter().flatten()
    }

    #[must_use]
    pub fn device(&self, id: DeviceId) -> Option<&Device> {
        self.devices.get(&id)
    }

    /// All devices in id order.
    pub fn devices(&self) -> impl Iterator<Item = &Device> {
        self.devices.values()
    }

    /// All connections in canonical key order.
    pub fn connections(&self) -> impl Iterator<Item = &Connection> {
        self.connections.values()
    }

    /// The stored connection between two devices, in either direction.
    #[must_use]
    pub fn connection(&self, a: DeviceId, b: DeviceId) -> Option<&Connection> {
        self.connections.get(&EdgeKey::new(a, b))
    }

    #[must_use]
    pub fn device_count(&self) -> usize {
        self.devices.len()
    }

    #[must_use]
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Whether the id is a known device or a connection endpoint.
    #[must_use]
    pub fn contains(&self, id: DeviceId) -> bool {
        self.adjacency.contains_key(&id)
    }

    // =========================================================================
    // PROJECTIONS
    // =========================================================================

    /// Purdue-level layout of the current graph.
    #[must_use]
    pub fn build_graph(&self) -> TopologyView {
        layout::build_graph(self)
    }

    /// Immutable export of the current graph, stamped with `now`.
    #[must_use]
    pub fn create_snapshot(&self, now: DateTime<Utc>) -> Snapshot {
        snapshot::create_snapshot(self, now)
    }

    /// Counts and histograms over the current graph.
    #[must_use]
    pub fn statistics(&self) -> TopologyStatistics {
        TopologyStatistics::collect(self)
    }
}

// =============================================================================
// TESTS
// =============================================================================
