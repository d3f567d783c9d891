//! Binary snapshot format.
//!
//! Layout: 5-byte header followed by a postcard payload.
//! - 4 bytes: magic (`OTGS`)
//! - 1 byte: format version
//!
//! The decoder checks total size and header before touching the payload.

use crate::primitives::{FORMAT_VERSION, MAGIC_BYTES, MAX_SNAPSHOT_PAYLOAD_SIZE};
use crate::{OtGraphError, Snapshot};

const HEADER_LEN: usize = 5;

/// Header preceding every encoded snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotHeader {
    pub magic: [u8; 4],
    pub version: u8,
}

impl SnapshotHeader {
    /// Header for the current format version.
    #[must_use]
    pub fn new() -> Self {
        Self {
            magic: *MAGIC_BYTES,
            version: FORMAT_VERSION,
        }
    }

    pub fn validate(&self) -> Result<(), OtGraphError> {
        if &self.magic != MAGIC_BYTES {
            return Err(OtGraphError::DeserializationError(
                "Invalid magic bytes".to_string(),
            ));
        }
        if self.version != FORMAT_VERSION {
            return Err(OtGraphError::DeserializationError(format!(
                "Unsupported version: {} (expected {})",
                self.version, FORMAT_VERSION
            )));
        }
        Ok(())
    }

    #[must_use]
    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut bytes = [0u8; HEADER_LEN];
        bytes[..4].copy_from_slice(&self.magic);
        bytes[4] = self.version;
        bytes
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, OtGraphError> {
        if bytes.len() < HEADER_LEN {
            return Err(OtGraphError::DeserializationError(
                "Header too short".to_string(),
            ));
        }
        let mut magic = [0u8; 4];
        magic.copy_from_slice(&bytes[..4]);
        Ok(Self {
            magic,
            version: bytes[4],
        })
    }
}

impl Default for SnapshotHeader {
    fn default() -> Self {
        Self::new()
    }
}

/// Encode a snapshot (header + postcard payload).
pub fn snapshot_to_bytes(snapshot: &Snapshot) -> Result<Vec<u8>, OtGraphError> {
    let payload = postcard::to_stdvec(snapshot)
        .map_err(|e| OtGraphError::SerializationError(e.to_string()))?;

    let mut bytes = Vec::with_capacity(HEADER_LEN + payload.len());
    bytes.extend_from_slice(&SnapshotHeader::new().to_bytes());
    bytes.extend_from_slice(&payload);
    Ok(bytes)
}

/// Decode a snapshot produced by [`snapshot_to_bytes`].
pub fn snapshot_from_bytes(bytes: &[u8]) -> Result<Snapshot, OtGraphError> {
    if bytes.len() > MAX_SNAPSHOT_PAYLOAD_SIZE {
        return Err(OtGraphError::DeserializationError(format!(
            "Data size {} bytes exceeds maximum allowed {} bytes",
            bytes.len(),
            MAX_SNAPSHOT_PAYLOAD_SIZE
        )));
    }

    let header = SnapshotHeader::from_bytes(bytes)?;
    header.validate()?;

    postcard::from_bytes(&bytes[HEADER_LEN..]).map_err(|e| {
        OtGraphError::DeserializationError(format!("Failed to decode snapshot: {}", e))
    })
}

/// BLAKE3 hex digest of the encoded snapshot.
#[cfg(feature = "crypto-hash")]
pub fn snapshot_fingerprint(snapshot: &Snapshot) -> Result<String, OtGraphError> {
    let bytes = snapshot_to_bytes(snapshot)?;
    Ok(blake3::hash(&bytes).to_hex().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        CandidateObservation, Connection, CorrelatorConfig, DeviceType, MetaValue,
        NetworkInterface, Session,
    };
    use chrono::{TimeZone, Utc};

    fn sample() -> Snapshot {
        let now = Utc
            .with_ymd_and_hms(2026, 2, 2, 2, 2, 2)
            .single()
            .expect("valid time");
        let mut session = Session::new(CorrelatorConfig::default()).expect("session");
        let results = session.ingest_at(
            &[
                CandidateObservation::new("snmp", 80)
                    .with_mac("00:0e:8c:01:02:03")
                    .with_hostname("plc-01")
                    .with_device_type(DeviceType::Plc)
                    .with_interface(
                        NetworkInterface::new("eth0")
                            .with_ip("10.0.1.5")
                            .with_netmask("255.255.255.0"),
                    )
                    .with_metadata("rack", 3_i64)
                    .with_metadata("descr", MetaValue::text_list(["S7", "CPU 1516"])),
                CandidateObservation::new("arp", 60).with_ip("10.0.1.20"),
            ],
            now,
        );
        session.add_connection(
            Connection::new(results[0].device.id, results[1].device.id, now)
                .with_protocol("s7comm", Some(102)),
        );
        session.snapshot_at(now)
    }

    #[test]
    fn header_roundtrip() {
        let header = SnapshotHeader::new();
        let restored = SnapshotHeader::from_bytes(&header.to_bytes()).expect("header");
        assert_eq!(restored, header);
        assert!(restored.validate().is_ok());
    }

    #[test]
    fn snapshot_survives_encoding() {
        let snapshot = sample();
        let bytes = snapshot_to_bytes(&snapshot).expect("encode");
        assert_eq!(&bytes[..4], MAGIC_BYTES);

        let restored = snapshot_from_bytes(&bytes).expect("decode");
        assert_eq!(restored, snapshot);
        assert_eq!(snapshot_to_bytes(&restored).expect("re-encode"), bytes);
    }

    #[test]
    fn invalid_magic_rejected() {
        let mut bytes = snapshot_to_bytes(&sample()).expect("encode");
        bytes[..4].copy_from_slice(b"XXXX");
        assert!(matches!(
            snapshot_from_bytes(&bytes),
            Err(OtGraphError::DeserializationError(_))
        ));
    }

    #[test]
    fn wrong_version_rejected() {
        let mut bytes = snapshot_to_bytes(&sample()).expect("encode");
        bytes[4] = FORMAT_VERSION + 1;
        assert!(snapshot_from_bytes(&bytes).is_err());
    }

    #[test]
    fn truncated_input_rejected() {
        assert!(snapshot_from_bytes(b"OTG").is_err());
        let bytes = snapshot_to_bytes(&sample()).expect("encode");
        assert!(snapshot_from_bytes(&bytes[..bytes.len() / 2]).is_err());
    }

    #[cfg(feature = "crypto-hash")]
    #[test]
    fn fingerprint_is_stable() {
        let snapshot = sample();
        let a = snapshot_fingerprint(&snapshot).expect("hash");
        let b = snapshot_fingerprint(&snapshot).expect("hash");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }
}
