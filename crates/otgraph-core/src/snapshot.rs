//! # Snapshot Module
//!
//! Immutable export of the whole topology: devices, connections, one zone
//! definition per populated Purdue level, and summary metadata.
//!
//! Snapshots are plain values. Handing them to persistence or broadcast is
//! the caller's job; the binary codec lives in [`crate::formats`].

use crate::classification;
use crate::topology::Topology;
use crate::{Connection, Device, DeviceId, PurdueLevel, SecurityZone};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::net::Ipv4Addr;

/// Devices of one Purdue level and the subnets they sit on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneDefinition {
    pub name: String,
    pub purdue_level: PurdueLevel,
    pub security_zone: SecurityZone,
    pub devices: Vec<DeviceId>,
    /// Distinct IPv4 subnets in CIDR notation, sorted.
    pub subnets: Vec<String>,
}

/// Summary of a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotMetadata {
    pub device_count: usize,
    pub connection_count: usize,
    /// Seconds from the earliest discovery to the latest sighting.
    pub collection_duration_secs: u64,
    /// Distinct telemetry sources across all devices, sorted.
    pub sources: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Point-in-time copy of the topology.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub devices: Vec<Device>,
    pub connections: Vec<Connection>,
    pub zones: Vec<ZoneDefinition>,
    pub metadata: SnapshotMetadata,
}

/// CIDR of the network an address sits on.
///
/// Network address is `ip & mask`, prefix length is the number of set bits
/// in the mask. `None` when either side is not a dotted-quad IPv4 address.
#[must_use]
pub fn subnet_cidr(ip: &str, netmask: &str) -> Option<String> {
    let ip: Ipv4Addr = ip.trim().parse().ok()?;
    let mask: Ipv4Addr = netmask.trim().parse().ok()?;
    let mask_bits = u32::from(mask);
    let network = Ipv4Addr::from(u32::from(ip) & mask_bits);
    Some(format!("{}/{}", network, mask_bits.count_ones()))
}

fn device_subnets(device: &Device) -> impl Iterator<Item = String> + '_ {
    device.interfaces.iter().filter_map(|iface| {
        let ip = iface.ip_address.as_deref()?;
        let mask = iface.netmask.as_deref()?;
        subnet_cidr(ip, mask)
    })
}

fn collection_duration_secs(devices: &[Device]) -> u64 {
    let earliest = devices.iter().map(|d| d.discovered_at).min();
    let latest = devices.iter().map(|d| d.last_seen).max();
    match (earliest, latest) {
        (Some(start), Some(end)) => end.signed_duration_since(start).num_seconds().max(0) as u64,
        _ => 0,
    }
}

/// Zone shared by every member, or the table zone of the level when
/// reclassified members disagree.
fn members_zone(members: &[&Device], level: PurdueLevel) -> SecurityZone {
    let mut zones = members.iter().map(|d| d.security_zone);
    match zones.next() {
        Some(first) if zones.all(|z| z == first) => first,
        _ => classification::zone_for(level),
    }
}

/// Build zone definitions for every populated level, in layout order.
#[must_use]
pub fn zone_definitions(devices: &[Device]) -> Vec<ZoneDefinition> {
    PurdueLevel::ORDER
        .iter()
        .filter_map(|&level| {
            let members: Vec<&Device> =
                devices.iter().filter(|d| d.purdue_level == level).collect();
            if members.is_empty() {
                return None;
            }
            let subnets: BTreeSet<String> =
                members.iter().flat_map(|d| device_subnets(d)).collect();
            Some(ZoneDefinition {
                name: level.label().to_string(),
                purdue_level: level,
                security_zone: members_zone(&members, level),
                devices: members.iter().map(|d| d.id).collect(),
                subnets: subnets.into_iter().collect(),
            })
        })
        .collect()
}

/// Copy the topology into a snapshot stamped with `now`.
#[must_use]
pub fn create_snapshot(topology: &Topology, now: DateTime<Utc>) -> Snapshot {
    let devices: Vec<Device> = topology.devices().cloned().collect();
    let connections: Vec<Connection> = topology.connections().cloned().collect();

    let sources: BTreeSet<String> = devices.iter().flat_map(Device::sources).collect();

    let metadata = SnapshotMetadata {
        device_count: devices.len(),
        connection_count: connections.len(),
        collection_duration_secs: collection_duration_secs(&devices),
        sources: sources.into_iter().collect(),
        created_at: now,
    };

    Snapshot {
        zones: zone_definitions(&devices),
        devices,
        connections,
        metadata,
    }
}
