//! # Engine Constants
//!
//! Hardcoded constants for the otgraph CORE.
//!
//! These values are compiled into the binary and are immutable at runtime.
//! Only the source priority order and the staleness window are configurable
//! (see [`crate::CorrelatorConfig`]); everything else here is fixed policy.

use uuid::Uuid;

// =============================================================================
// CORRELATION DEFAULTS
// =============================================================================

/// Default staleness window in minutes.
///
/// An observation this old contributes nothing to confidence.
pub const DEFAULT_STALENESS_MINUTES: u32 = 15;

/// Default source priority, highest first.
///
/// Sources missing from the configured list sort after every listed source.
pub const DEFAULT_SOURCE_PRIORITY: &[&str] = &["snmp", "arp", "mac_table", "netflow", "syslog"];

// =============================================================================
// CONFIDENCE SCORING (integer fixed point)
// =============================================================================

/// Freshness is expressed in thousandths: 1000 = fully fresh, 0 = stale.
pub const FRESHNESS_SCALE: u64 = 1000;

/// Points contributed per fully fresh source.
pub const SOURCE_POINTS: u64 = 15;

/// Cap on the freshness-weighted source-count term.
pub const SOURCE_POINTS_CAP: u64 = 45;

/// Points contributed per identity key kind that linked the result.
pub const MATCH_POINTS: u64 = 15;

/// Share of the inherited candidate confidence, as a ratio (0.4 = 2/5).
pub const TRUST_NUMERATOR: u64 = 2;
pub const TRUST_DENOMINATOR: u64 = 5;

/// Upper bound of any confidence score.
pub const MAX_CONFIDENCE: u8 = 100;

// =============================================================================
// DEVICE SYNTHESIS
// =============================================================================

/// Name given to a device with no sysName, hostname or IP.
pub const UNKNOWN_DEVICE_NAME: &str = "Unknown Device";

/// Name of the interface synthesized from a cluster's merged MAC/IP.
pub const PRIMARY_INTERFACE_NAME: &str = "primary";

/// Metadata key holding the list of contributing source tags.
pub const META_SOURCES: &str = "sources";

/// Metadata key holding the latest correlation confidence.
pub const META_CORRELATION_CONFIDENCE: &str = "correlation_confidence";

/// Metadata key holding the SNMP sysName, when one was observed.
pub const META_SYS_NAME: &str = "sys_name";

/// Metadata keys written by the correlator. Candidate metadata never sets them.
pub const RESERVED_METADATA_KEYS: [&str; 3] =
    [META_SOURCES, META_CORRELATION_CONFIDENCE, META_SYS_NAME];

/// Namespace for UUIDv5 device identifiers.
pub const DEVICE_ID_NAMESPACE: Uuid = Uuid::from_u128(0x6f74_6772_6170_4000_8000_6465_7669_6365);

/// Namespace for UUIDv5 connection identifiers.
pub const CONNECTION_ID_NAMESPACE: Uuid =
    Uuid::from_u128(0x6f74_6772_6170_4000_8000_636f_6e6e_6563);

// =============================================================================
// LAYOUT
// =============================================================================

/// Vertical distance between two Purdue level rows.
pub const LEVEL_SPACING: i64 = 150;

/// Horizontal distance between two nodes of the same level. Must be even so
/// that symmetric placement around x = 0 stays integral.
pub const NODE_SPACING: i64 = 200;

// =============================================================================
// SNAPSHOT FORMAT
// =============================================================================

/// Magic bytes for the binary snapshot header.
pub const MAGIC_BYTES: &[u8; 4] = b"OTGS";

/// Current snapshot format version.
///
/// Increment this when making breaking changes to the snapshot layout.
pub const FORMAT_VERSION: u8 = 1;

/// Maximum encoded snapshot payload accepted by the decoder (256 MB).
pub const MAX_SNAPSHOT_PAYLOAD_SIZE: usize = 256 * 1024 * 1024;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_spacing_is_even() {
        assert_eq!(NODE_SPACING % 2, 0);
    }

    #[test]
    fn namespaces_differ() {
        assert_ne!(DEVICE_ID_NAMESPACE, CONNECTION_ID_NAMESPACE);
    }

    #[test]
    fn magic_bytes_correct() {
        assert_eq!(MAGIC_BYTES, b"OTGS");
    }
}
