//! # Classification Tables
//!
//! Static lookup tables seeding a device's Purdue level and security zone
//! from its device type. The external classifier may overwrite both fields
//! after correlation; these tables only provide the initial placement.

use crate::{DeviceType, PurdueLevel, SecurityZone};

/// Level assigned when the device type is unknown: the lowest-trust tier.
pub const DEFAULT_LEVEL: PurdueLevel = PurdueLevel::L5;

/// Device type → Purdue level.
pub const DEVICE_TYPE_LEVELS: &[(DeviceType, PurdueLevel)] = &[
    (DeviceType::Sensor, PurdueLevel::L0),
    (DeviceType::Actuator, PurdueLevel::L0),
    (DeviceType::Plc, PurdueLevel::L1),
    (DeviceType::Rtu, PurdueLevel::L1),
    (DeviceType::Ied, PurdueLevel::L1),
    (DeviceType::SafetyController, PurdueLevel::L1),
    (DeviceType::Hmi, PurdueLevel::L2),
    (DeviceType::ScadaServer, PurdueLevel::L2),
    (DeviceType::EngineeringWorkstation, PurdueLevel::L2),
    (DeviceType::Historian, PurdueLevel::L3),
    (DeviceType::Switch, PurdueLevel::L3),
    (DeviceType::Router, PurdueLevel::L3),
    (DeviceType::Firewall, PurdueLevel::Dmz),
    (DeviceType::Server, PurdueLevel::L4),
    (DeviceType::Workstation, PurdueLevel::L4),
];

/// Purdue level → security zone.
pub const LEVEL_ZONES: &[(PurdueLevel, SecurityZone)] = &[
    (PurdueLevel::L0, SecurityZone::Process),
    (PurdueLevel::L1, SecurityZone::Control),
    (PurdueLevel::L2, SecurityZone::Supervisory),
    (PurdueLevel::L3, SecurityZone::Operations),
    (PurdueLevel::Dmz, SecurityZone::Dmz),
    (PurdueLevel::L4, SecurityZone::Business),
    (PurdueLevel::L5, SecurityZone::Enterprise),
];

/// Purdue level for a device type.
#[must_use]
pub fn level_for(device_type: DeviceType) -> PurdueLevel {
    DEVICE_TYPE_LEVELS
        .iter()
        .find(|(t, _)| *t == device_type)
        .map(|(_, level)| *level)
        .unwrap_or(DEFAULT_LEVEL)
}

/// Security zone for a Purdue level.
#[must_use]
pub fn zone_for(level: PurdueLevel) -> SecurityZone {
    LEVEL_ZONES
        .iter()
        .find(|(l, _)| *l == level)
        .map(|(_, zone)| *zone)
        .unwrap_or(SecurityZone::Enterprise)
}

/// Level and zone for a device type.
#[must_use]
pub fn classify(device_type: DeviceType) -> (PurdueLevel, SecurityZone) {
    let level = level_for(device_type);
    (level, zone_for(level))
}
