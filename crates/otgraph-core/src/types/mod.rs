//! # Core Type Definitions
//!
//! This module contains all core types for the otgraph discovery engine:
//! - Identifiers (`DeviceId`, `ConnectionId`, `EdgeKey`)
//! - Resolved entities (`Device`, `NetworkInterface`, `Connection`)
//! - Ingestion input (`CandidateObservation`)
//! - Classification enums (`DeviceType`, `PurdueLevel`, `SecurityZone`, ...)
//! - Error types (`OtGraphError`)
//!
//! ## Determinism Guarantees
//!
//! All types in this module:
//! - Use integer arithmetic only (no floating-point)
//! - Implement `Ord` where they key a `BTreeMap`/`BTreeSet`
//! - Derive identifiers from content (UUIDv5), never from randomness

mod metadata;

pub use metadata::{MetaValue, Metadata};

use crate::primitives::{
    CONNECTION_ID_NAMESPACE, META_CORRELATION_CONFIDENCE, META_SOURCES, UNKNOWN_DEVICE_NAME,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Stable identifier of a resolved device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(pub Uuid);

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for DeviceId {
    type Err = OtGraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| OtGraphError::InvalidId(s.to_string()))
    }
}

/// Identifier of a topology connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(pub Uuid);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Order-independent key of a connection: the sorted endpoint pair.
///
/// `EdgeKey::new(a, b) == EdgeKey::new(b, a)` for all `a`, `b`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EdgeKey {
    low: DeviceId,
    high: DeviceId,
}

impl EdgeKey {
    /// Build the canonical key for an unordered device pair.
    #[must_use]
    pub fn new(a: DeviceId, b: DeviceId) -> Self {
        if a <= b {
            Self { low: a, high: b }
        } else {
            Self { low: b, high: a }
        }
    }

    /// The smaller endpoint.
    #[must_use]
    pub fn low(&self) -> DeviceId {
        self.low
    }

    /// The larger endpoint.
    #[must_use]
    pub fn high(&self) -> DeviceId {
        self.high
    }

    /// Deterministic connection id for this key.
    #[must_use]
    pub fn connection_id(&self) -> ConnectionId {
        let mut name = [0u8; 32];
        name[..16].copy_from_slice(self.low.0.as_bytes());
        name[16..].copy_from_slice(self.high.0.as_bytes());
        ConnectionId(Uuid::new_v5(&CONNECTION_ID_NAMESPACE, &name))
    }
}

// =============================================================================
// CLASSIFICATION ENUMS
// =============================================================================

/// Functional role of a device on the plant network.
///
/// Unrecognised strings deserialize to `Unknown`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum DeviceType {
    Plc,
    Rtu,
    Ied,
    SafetyController,
    Hmi,
    ScadaServer,
    EngineeringWorkstation,
    Historian,
    Sensor,
    Actuator,
    Switch,
    Router,
    Firewall,
    Server,
    Workstation,
    #[default]
    #[serde(other)]
    Unknown,
}

impl DeviceType {
    /// Every device type, in declaration order.
    pub const ALL: [DeviceType; 16] = [
        Self::Plc,
        Self::Rtu,
        Self::Ied,
        Self::SafetyController,
        Self::Hmi,
        Self::ScadaServer,
        Self::EngineeringWorkstation,
        Self::Historian,
        Self::Sensor,
        Self::Actuator,
        Self::Switch,
        Self::Router,
        Self::Firewall,
        Self::Server,
        Self::Workstation,
        Self::Unknown,
    ];

    /// Whether the type carries information (anything but `Unknown`).
    #[must_use]
    pub fn is_known(self) -> bool {
        self != Self::Unknown
    }
}

/// Purdue model tier.
///
/// Variant order is the layout order: 0, 1, 2, 3, DMZ, 4, 5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PurdueLevel {
    L0,
    L1,
    L2,
    L3,
    #[serde(rename = "DMZ")]
    Dmz,
    L4,
    L5,
}

impl PurdueLevel {
    /// All levels in layout order.
    pub const ORDER: [PurdueLevel; 7] = [
        Self::L0,
        Self::L1,
        Self::L2,
        Self::L3,
        Self::Dmz,
        Self::L4,
        Self::L5,
    ];

    /// Row index of this level in the layout (0 for L0 ... 6 for L5).
    #[must_use]
    pub fn layout_row(self) -> usize {
        Self::ORDER.iter().position(|l| *l == self).unwrap_or(0)
    }

    /// Display label.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::L0 => "Level 0",
            Self::L1 => "Level 1",
            Self::L2 => "Level 2",
            Self::L3 => "Level 3",
            Self::Dmz => "DMZ",
            Self::L4 => "Level 4",
            Self::L5 => "Level 5",
        }
    }
}

/// Named trust boundary derived from the Purdue level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecurityZone {
    Process,
    Control,
    Supervisory,
    Operations,
    Dmz,
    Business,
    Enterprise,
}

/// Reachability status of a device.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum DeviceStatus {
    Online,
    Offline,
    Degraded,
    #[default]
    Unknown,
}

/// Link status of a single interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum InterfaceStatus {
    Up,
    Down,
    #[default]
    Unknown,
}

/// Physical or logical nature of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionType {
    #[default]
    Ethernet,
    Serial,
    Wireless,
    Vpn,
    Logical,
}

/// Identity signal that linked observations to each other or to a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrelationKey {
    Mac,
    Ip,
    Hostname,
    SysName,
}

// =============================================================================
// NETWORK INTERFACE
// =============================================================================

/// One network interface of a device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct NetworkInterface {
    pub name: String,
    #[serde(default)]
    pub mac_address: Option<String>,
    #[serde(default)]
    pub ip_address: Option<String>,
    /// Dotted-quad netmask, used to derive subnets in snapshots.
    #[serde(default)]
    pub netmask: Option<String>,
    #[serde(default)]
    pub vlan: Option<u16>,
    /// Link speed in bits per second.
    #[serde(default)]
    pub speed: Option<u64>,
    #[serde(default)]
    pub status: InterfaceStatus,
}

impl NetworkInterface {
    /// Create an interface with only a name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_mac(mut self, mac: impl Into<String>) -> Self {
        self.mac_address = Some(mac.into());
        self
    }

    #[must_use]
    pub fn with_ip(mut self, ip: impl Into<String>) -> Self {
        self.ip_address = Some(ip.into());
        self
    }

    #[must_use]
    pub fn with_netmask(mut self, netmask: impl Into<String>) -> Self {
        self.netmask = Some(netmask.into());
        self
    }
}

// =============================================================================
// CANDIDATE OBSERVATION
// =============================================================================

/// One source's report about a possible device.
///
/// Produced by the external telemetry parsers; consumed once by
/// [`crate::Correlator::correlate`]. Empty strings count as absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CandidateObservation {
    /// Source tag, e.g. `snmp`, `arp`, `netflow`, `syslog`.
    pub source: String,
    #[serde(default)]
    pub mac_address: Option<String>,
    #[serde(default)]
    pub ip_address: Option<String>,
    #[serde(default)]
    pub hostname: Option<String>,
    #[serde(default)]
    pub sys_name: Option<String>,
    #[serde(default)]
    pub vendor: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub device_type: Option<DeviceType>,
    #[serde(default)]
    pub interfaces: Vec<NetworkInterface>,
    #[serde(default)]
    pub metadata: Metadata,
    /// Source-assigned confidence, 0-100.
    #[serde(default)]
    pub confidence: u8,
    #[serde(default)]
    pub observed_at: Option<DateTime<Utc>>,
}

/// Treat `Some("")` and whitespace-only strings as absent.
fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

impl CandidateObservation {
    /// Create an observation with a source tag and confidence.
    #[must_use]
    pub fn new(source: impl Into<String>, confidence: u8) -> Self {
        Self {
            source: source.into(),
            confidence,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_mac(mut self, mac: impl Into<String>) -> Self {
        self.mac_address = Some(mac.into());
        self
    }

    #[must_use]
    pub fn with_ip(mut self, ip: impl Into<String>) -> Self {
        self.ip_address = Some(ip.into());
        self
    }

    #[must_use]
    pub fn with_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = Some(hostname.into());
        self
    }

    #[must_use]
    pub fn with_sys_name(mut self, sys_name: impl Into<String>) -> Self {
        self.sys_name = Some(sys_name.into());
        self
    }

    #[must_use]
    pub fn with_vendor(mut self, vendor: impl Into<String>) -> Self {
        self.vendor = Some(vendor.into());
        self
    }

    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    #[must_use]
    pub fn with_device_type(mut self, device_type: DeviceType) -> Self {
        self.device_type = Some(device_type);
        self
    }

    #[must_use]
    pub fn with_interface(mut self, interface: NetworkInterface) -> Self {
        self.interfaces.push(interface);
        self
    }

    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<MetaValue>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn observed_at(mut self, at: DateTime<Utc>) -> Self {
        self.observed_at = Some(at);
        self
    }

    pub fn mac(&self) -> Option<&str> {
        non_empty(&self.mac_address)
    }

    pub fn ip(&self) -> Option<&str> {
        non_empty(&self.ip_address)
    }

    pub fn host(&self) -> Option<&str> {
        non_empty(&self.hostname)
    }

    pub fn sys(&self) -> Option<&str> {
        non_empty(&self.sys_name)
    }

    pub fn vendor_name(&self) -> Option<&str> {
        non_empty(&self.vendor)
    }

    pub fn model_name(&self) -> Option<&str> {
        non_empty(&self.model)
    }

    /// Device type, with `Unknown` treated as absent.
    pub fn known_type(&self) -> Option<DeviceType> {
        self.device_type.filter(|t| t.is_known())
    }
}

// =============================================================================
// DEVICE
// =============================================================================

/// A resolved, canonical device.
///
/// Created by the correlator on first resolution of a novel identity and
/// mutated in place afterwards. The core never deletes devices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub id: DeviceId,
    pub name: String,
    #[serde(default)]
    pub hostname: Option<String>,
    #[serde(default)]
    pub device_type: DeviceType,
    #[serde(default)]
    pub vendor: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    pub purdue_level: PurdueLevel,
    pub security_zone: SecurityZone,
    #[serde(default)]
    pub status: DeviceStatus,
    #[serde(default)]
    pub interfaces: Vec<NetworkInterface>,
    #[serde(default)]
    pub metadata: Metadata,
    pub discovered_at: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Device {
    /// Create an unclassified device with all timestamps set to `now`.
    #[must_use]
    pub fn new(id: DeviceId, name: impl Into<String>, now: DateTime<Utc>) -> Self {
        let (purdue_level, security_zone) = crate::classification::classify(DeviceType::Unknown);
        Self {
            id,
            name: name.into(),
            hostname: None,
            device_type: DeviceType::Unknown,
            vendor: None,
            model: None,
            purdue_level,
            security_zone,
            status: DeviceStatus::Unknown,
            interfaces: Vec::new(),
            metadata: Metadata::new(),
            discovered_at: now,
            last_seen: now,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the name is still the placeholder given to anonymous devices.
    #[must_use]
    pub fn has_placeholder_name(&self) -> bool {
        self.name == UNKNOWN_DEVICE_NAME
    }

    /// Source tags that have contributed to this device.
    #[must_use]
    pub fn sources(&self) -> Vec<String> {
        self.metadata
            .get(META_SOURCES)
            .and_then(MetaValue::as_list)
            .map(|items| {
                items
                    .iter()
                    .filter_map(MetaValue::as_text)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Confidence assigned by the most recent correlation, if any.
    #[must_use]
    pub fn correlation_confidence(&self) -> Option<u8> {
        self.metadata
            .get(META_CORRELATION_CONFIDENCE)
            .and_then(MetaValue::as_int)
            .and_then(|n| u8::try_from(n).ok())
    }

    /// IPv4/IPv6 addresses across all interfaces, in interface order.
    pub fn ip_addresses(&self) -> impl Iterator<Item = &str> {
        self.interfaces
            .iter()
            .filter_map(|iface| non_empty(&iface.ip_address))
    }
}

// =============================================================================
// CONNECTION
// =============================================================================

/// A topology edge between two devices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub id: ConnectionId,
    pub source_id: DeviceId,
    pub target_id: DeviceId,
    #[serde(default)]
    pub connection_type: ConnectionType,
    #[serde(default)]
    pub protocol: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    /// Observed bandwidth in bits per second.
    #[serde(default)]
    pub bandwidth: Option<u64>,
    #[serde(default)]
    pub secure: bool,
    #[serde(default)]
    pub encryption: Option<String>,
    pub discovered_at: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    #[serde(default)]
    pub metadata: Metadata,
}

impl Connection {
    /// Create a connection whose id is derived from its canonical key.
    #[must_use]
    pub fn new(source_id: DeviceId, target_id: DeviceId, now: DateTime<Utc>) -> Self {
        Self {
            id: EdgeKey::new(source_id, target_id).connection_id(),
            source_id,
            target_id,
            connection_type: ConnectionType::default(),
            protocol: None,
            port: None,
            bandwidth: None,
            secure: false,
            encryption: None,
            discovered_at: now,
            last_seen: now,
            metadata: Metadata::new(),
        }
    }

    /// Canonical, order-independent key of this connection.
    #[must_use]
    pub fn key(&self) -> EdgeKey {
        EdgeKey::new(self.source_id, self.target_id)
    }

    /// Whether `device` is one of the endpoints.
    #[must_use]
    pub fn touches(&self, device: DeviceId) -> bool {
        self.source_id == device || self.target_id == device
    }

    #[must_use]
    pub fn with_type(mut self, connection_type: ConnectionType) -> Self {
        self.connection_type = connection_type;
        self
    }

    #[must_use]
    pub fn with_protocol(mut self, protocol: impl Into<String>, port: Option<u16>) -> Self {
        self.protocol = Some(protocol.into());
        self.port = port;
        self
    }

    #[must_use]
    pub fn with_bandwidth(mut self, bandwidth: u64) -> Self {
        self.bandwidth = Some(bandwidth);
        self
    }

    #[must_use]
    pub fn with_encryption(mut self, encryption: impl Into<String>) -> Self {
        self.secure = true;
        self.encryption = Some(encryption.into());
        self
    }

    #[must_use]
    pub fn seen_at(mut self, at: DateTime<Utc>) -> Self {
        self.last_seen = at;
        self
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in otgraph.
///
/// Resolution and topology operations are infallible; only configuration,
/// encoding and lookups by caller-supplied ids can fail.
#[derive(Debug, Error)]
pub enum OtGraphError {
    /// Configuration values are out of range or inconsistent.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A request was rejected before reaching the correlator.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// An identifier string could not be parsed.
    #[error("Invalid identifier: {0}")]
    InvalidId(String),

    /// The requested device is not known.
    #[error("Device not found: {0}")]
    DeviceNotFound(DeviceId),

    /// A serialization error occurred.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// A deserialization error occurred.
    #[error("Deserialization error: {0}")]
    DeserializationError(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(String),
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: u128) -> DeviceId {
        DeviceId(Uuid::from_u128(n))
    }

    #[test]
    fn edge_key_is_order_independent() {
        assert_eq!(EdgeKey::new(id(1), id(2)), EdgeKey::new(id(2), id(1)));
        assert_eq!(EdgeKey::new(id(2), id(1)).low(), id(1));
        assert_eq!(EdgeKey::new(id(2), id(1)).high(), id(2));
    }

    #[test]
    fn edge_key_self_loop() {
        let key = EdgeKey::new(id(7), id(7));
        assert_eq!(key.low(), key.high());
    }

    #[test]
    fn connection_id_is_stable_for_both_directions() {
        let now = Utc::now();
        let forward = Connection::new(id(1), id(2), now);
        let backward = Connection::new(id(2), id(1), now);
        assert_eq!(forward.id, backward.id);
        assert_eq!(forward.key(), backward.key());
    }

    #[test]
    fn purdue_levels_sort_in_layout_order() {
        let mut levels = vec![PurdueLevel::L4, PurdueLevel::Dmz, PurdueLevel::L0, PurdueLevel::L3];
        levels.sort();
        assert_eq!(
            levels,
            vec![PurdueLevel::L0, PurdueLevel::L3, PurdueLevel::Dmz, PurdueLevel::L4]
        );
        assert_eq!(PurdueLevel::Dmz.layout_row(), 4);
        assert_eq!(PurdueLevel::L5.layout_row(), 6);
    }

    #[test]
    fn blank_fields_count_as_absent() {
        let candidate = CandidateObservation::new("arp", 50)
            .with_mac("")
            .with_hostname("   ")
            .with_ip("10.0.0.1")
            .with_device_type(DeviceType::Unknown);

        assert_eq!(candidate.mac(), None);
        assert_eq!(candidate.host(), None);
        assert_eq!(candidate.ip(), Some("10.0.0.1"));
        assert_eq!(candidate.known_type(), None);
    }

    #[test]
    fn device_id_parses_from_string() {
        let original = id(42);
        let parsed: DeviceId = original.to_string().parse().expect("parse");
        assert_eq!(parsed, original);
        assert!("not-a-uuid".parse::<DeviceId>().is_err());
    }

    #[test]
    fn device_reads_sources_and_confidence_from_metadata() {
        let mut device = Device::new(id(1), "plc-01", Utc::now());
        assert!(device.sources().is_empty());
        assert_eq!(device.correlation_confidence(), None);

        device
            .metadata
            .insert(META_SOURCES.to_string(), MetaValue::text_list(["snmp", "arp"]));
        device
            .metadata
            .insert(META_CORRELATION_CONFIDENCE.to_string(), MetaValue::Int(73));

        assert_eq!(device.sources(), vec!["snmp".to_string(), "arp".to_string()]);
        assert_eq!(device.correlation_confidence(), Some(73));
    }
}
