//! Topology statistics.

use crate::topology::Topology;
use crate::{DeviceStatus, PurdueLevel};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Counts and histograms over one topology.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TopologyStatistics {
    pub device_count: usize,
    pub connection_count: usize,
    /// Connections flagged secure at first discovery.
    pub secure_connection_count: usize,
    pub by_level: BTreeMap<PurdueLevel, usize>,
    pub by_status: BTreeMap<DeviceStatus, usize>,
}

impl TopologyStatistics {
    /// Collect statistics from a topology.
    #[must_use]
    pub fn collect(topology: &Topology) -> Self {
        let mut stats = Self {
            device_count: topology.device_count(),
            connection_count: topology.connection_count(),
            secure_connection_count: topology.connections().filter(|c| c.secure).count(),
            ..Self::default()
        };

        for device in topology.devices() {
            *stats.by_level.entry(device.purdue_level).or_insert(0) += 1;
            *stats.by_status.entry(device.status).or_insert(0) += 1;
        }

        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Connection, Device, DeviceId};
    use chrono::Utc;
    use uuid::Uuid;

    #[test]
    fn histograms_count_every_device() {
        let now = Utc::now();
        let mut topology = Topology::new();
        for n in 1..=3u128 {
            let mut d = Device::new(DeviceId(Uuid::from_u128(n)), "d", now);
            if n == 3 {
                d.purdue_level = PurdueLevel::L1;
                d.status = DeviceStatus::Online;
            }
            topology.add_device(d);
        }
        topology.add_connection(
            Connection::new(DeviceId(Uuid::from_u128(1)), DeviceId(Uuid::from_u128(2)), now)
                .with_encryption("ipsec"),
        );
        topology.add_connection(Connection::new(
            DeviceId(Uuid::from_u128(2)),
            DeviceId(Uuid::from_u128(3)),
            now,
        ));

        let stats = topology.statistics();
        assert_eq!(stats.device_count, 3);
        assert_eq!(stats.connection_count, 2);
        assert_eq!(stats.secure_connection_count, 1);
        assert_eq!(stats.by_level.get(&PurdueLevel::L5), Some(&2));
        assert_eq!(stats.by_level.get(&PurdueLevel::L1), Some(&1));
        assert_eq!(stats.by_status.get(&DeviceStatus::Unknown), Some(&2));
        assert_eq!(stats.by_status.get(&DeviceStatus::Online), Some(&1));
    }

    #[test]
    fn empty_topology() {
        assert_eq!(Topology::new().statistics(), TopologyStatistics::default());
    }
}
