//! # API Request/Response Types
//!
//! This module defines the JSON structures for the HTTP API.

use chrono::{DateTime, Utc};
use otgraph_core::{
    CandidateObservation, Connection, ConnectionType, CorrelationResult, Device, DeviceId,
    Metadata, OtGraphError, PurdueLevel, SecurityZone, Snapshot, classification::zone_for,
};
use serde::{Deserialize, Serialize};

/// Maximum observations accepted in one ingest request.
pub const MAX_INGEST_BATCH: usize = 10_000;

/// Maximum length of a source tag, in bytes.
pub const MAX_SOURCE_LENGTH: usize = 64;

// =============================================================================
// HEALTH RESPONSE
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Bare error body for endpoints whose success payload has no error slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(msg: impl Into<String>) -> Self {
        Self { error: msg.into() }
    }
}

// =============================================================================
// INGEST REQUEST/RESPONSE
// =============================================================================

/// Batch of candidate observations from the telemetry parsers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestRequest {
    pub observations: Vec<CandidateObservation>,
}

impl IngestRequest {
    /// Check batch size and source tags before the batch reaches the correlator.
    pub fn validate(&self) -> Result<(), OtGraphError> {
        if self.observations.len() > MAX_INGEST_BATCH {
            return Err(OtGraphError::InvalidRequest(format!(
                "Batch of {} observations exceeds maximum {}",
                self.observations.len(),
                MAX_INGEST_BATCH
            )));
        }
        for (i, observation) in self.observations.iter().enumerate() {
            let source = observation.source.trim();
            if source.is_empty() {
                return Err(OtGraphError::InvalidRequest(format!(
                    "Observation {} has an empty source tag",
                    i
                )));
            }
            if source.len() > MAX_SOURCE_LENGTH {
                return Err(OtGraphError::InvalidRequest(format!(
                    "Observation {} source tag exceeds {} bytes",
                    i, MAX_SOURCE_LENGTH
                )));
            }
            if observation.confidence > 100 {
                return Err(OtGraphError::InvalidRequest(format!(
                    "Observation {} confidence {} is above 100",
                    i, observation.confidence
                )));
            }
        }
        Ok(())
    }
}

/// Ingest response: one result per resolved cluster.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestResponse {
    pub success: bool,
    pub created: usize,
    pub updated: usize,
    pub results: Vec<CorrelationResult>,
    pub error: Option<String>,
}

impl IngestResponse {
    pub fn success(results: Vec<CorrelationResult>) -> Self {
        let created = results.iter().filter(|r| r.created).count();
        Self {
            success: true,
            created,
            updated: results.len() - created,
            results,
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            created: 0,
            updated: 0,
            results: Vec::new(),
            error: Some(msg.into()),
        }
    }
}

// =============================================================================
// CONNECTION REQUEST/RESPONSE
// =============================================================================

/// Connection reported by a flow or table parser.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionRequest {
    pub source_id: String,
    pub target_id: String,
    #[serde(default)]
    pub connection_type: Option<ConnectionType>,
    #[serde(default)]
    pub protocol: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub bandwidth: Option<u64>,
    #[serde(default)]
    pub encryption: Option<String>,
    #[serde(default)]
    pub last_seen: Option<DateTime<Utc>>,
    #[serde(default)]
    pub metadata: Metadata,
}

impl ConnectionRequest {
    /// Build a connection, parsing both endpoint ids.
    ///
    /// `now` stamps `discovered_at`, and `last_seen` when the request has none.
    pub fn to_connection(&self, now: DateTime<Utc>) -> Result<Connection, OtGraphError> {
        let source: DeviceId = self.source_id.parse()?;
        let target: DeviceId = self.target_id.parse()?;

        let mut connection = Connection::new(source, target, now)
            .seen_at(self.last_seen.unwrap_or(now))
            .with_type(self.connection_type.unwrap_or_default());
        if let Some(protocol) = &self.protocol {
            connection = connection.with_protocol(protocol.clone(), self.port);
        } else {
            connection.port = self.port;
        }
        if let Some(bandwidth) = self.bandwidth {
            connection = connection.with_bandwidth(bandwidth);
        }
        if let Some(encryption) = &self.encryption {
            connection = connection.with_encryption(encryption.clone());
        }
        connection.metadata = self.metadata.clone();
        Ok(connection)
    }
}

/// Stored connection after the upsert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionResponse {
    pub success: bool,
    pub created: bool,
    pub connection: Option<Connection>,
    pub error: Option<String>,
}

impl ConnectionResponse {
    pub fn success(connection: Connection, created: bool) -> Self {
        Self {
            success: true,
            created,
            connection: Some(connection),
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            created: false,
            connection: None,
            error: Some(msg.into()),
        }
    }
}

// =============================================================================
// DEVICE RESPONSES
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DevicesResponse {
    pub count: usize,
    pub devices: Vec<Device>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConnectionsResponse {
    pub device_id: DeviceId,
    pub count: usize,
    pub connections: Vec<Connection>,
}

// =============================================================================
// CLASSIFICATION
// =============================================================================

/// Verdict from an external classifier.
///
/// Omitting `security_zone` derives it from the level.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationRequest {
    pub purdue_level: PurdueLevel,
    #[serde(default)]
    pub security_zone: Option<SecurityZone>,
}

impl ClassificationRequest {
    #[must_use]
    pub fn zone(&self) -> SecurityZone {
        self.security_zone
            .unwrap_or_else(|| zone_for(self.purdue_level))
    }
}

// =============================================================================
// PATH REQUEST/RESPONSE
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathRequest {
    pub source: String,
    pub target: String,
}

/// Shortest hop path between two devices.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathResponse {
    pub found: bool,
    pub path: Vec<DeviceId>,
    pub hops: usize,
    pub error: Option<String>,
}

impl PathResponse {
    pub fn from_path(path: Option<Vec<DeviceId>>) -> Self {
        match path {
            Some(path) => Self {
                found: true,
                hops: path.len().saturating_sub(1),
                path,
                error: None,
            },
            None => Self {
                found: false,
                path: Vec::new(),
                hops: 0,
                error: None,
            },
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            found: false,
            path: Vec::new(),
            hops: 0,
            error: Some(msg.into()),
        }
    }
}

// =============================================================================
// SNAPSHOT / EXPORT RESPONSES
// =============================================================================

/// JSON snapshot with the BLAKE3 fingerprint of its binary encoding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotResponse {
    pub fingerprint: String,
    pub snapshot: Snapshot,
}

/// Binary snapshot for archival, base64-encoded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportResponse {
    pub success: bool,
    pub data: Option<String>, // Base64 encoded
    pub fingerprint: Option<String>,
    pub error: Option<String>,
}

impl ExportResponse {
    pub fn success(data: Vec<u8>, fingerprint: String) -> Self {
        Self {
            success: true,
            data: Some(base64::Engine::encode(
                &base64::engine::general_purpose::STANDARD,
                &data,
            )),
            fingerprint: Some(fingerprint),
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            fingerprint: None,
            error: Some(msg.into()),
        }
    }
}
