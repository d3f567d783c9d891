//! # Session Module
//!
//! One resolver plus one topology store, owned together.
//!
//! A `Session` is an explicit value: construct one per process or tenant and
//! hand it to whatever drives ingestion. Every method takes `&self` or
//! `&mut self`; concurrent callers wrap the whole session in one lock.

use crate::correlator::{CorrelationResult, Correlator};
use crate::layout::TopologyView;
use crate::snapshot::Snapshot;
use crate::stats::TopologyStatistics;
use crate::topology::{ConnectionUpsert, Topology};
use crate::{
    CandidateObservation, Connection, CorrelatorConfig, Device, DeviceId, OtGraphError,
    PurdueLevel, SecurityZone,
};
use chrono::{DateTime, Utc};

/// Resolver and topology store sharing one lifetime.
#[derive(Debug, Clone, Default)]
pub struct Session {
    correlator: Correlator,
    topology: Topology,
}

impl Session {
    /// Create a session with a validated resolver configuration.
    pub fn new(config: CorrelatorConfig) -> Result<Self, OtGraphError> {
        Ok(Self {
            correlator: Correlator::new(config)?,
            topology: Topology::new(),
        })
    }

    // =========================================================================
    // INGESTION
    // =========================================================================

    /// Correlate a batch and upsert every resolved device into the topology.
    pub fn ingest(&mut self, batch: &[CandidateObservation]) -> Vec<CorrelationResult> {
        self.ingest_at(batch, Utc::now())
    }

    /// [`Session::ingest`] with an explicit clock.
    pub fn ingest_at(
        &mut self,
        batch: &[CandidateObservation],
        now: DateTime<Utc>,
    ) -> Vec<CorrelationResult> {
        let results = self.correlator.correlate_at(batch, now);
        for result in &results {
            self.topology.add_device(result.device.clone());
        }
        results
    }

    /// Insert or refresh a connection.
    pub fn add_connection(&mut self, connection: Connection) -> ConnectionUpsert {
        self.topology.add_connection(connection)
    }

    /// Apply an external classifier's verdict to a device.
    ///
    /// The topology copy changes only while the topology holds the device.
    pub fn reclassify(
        &mut self,
        id: DeviceId,
        level: PurdueLevel,
        zone: SecurityZone,
    ) -> Result<&Device, OtGraphError> {
        let device = self.correlator.reclassify(id, level, zone)?.clone();
        if self.topology.device(id).is_some() {
            self.topology.add_device(device);
        }
        self.correlator
            .device(id)
            .ok_or(OtGraphError::DeviceNotFound(id))
    }

    /// Reset the topology. Resolved identities are kept.
    pub fn clear(&mut self) {
        self.topology.clear();
    }

    // =========================================================================
    // READ ACCESS
    // =========================================================================

    #[must_use]
    pub fn correlator(&self) -> &Correlator {
        &self.correlator
    }

    #[must_use]
    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    /// Device by id, or `DeviceNotFound`.
    pub fn device(&self, id: DeviceId) -> Result<&Device, OtGraphError> {
        self.topology
            .device(id)
            .ok_or(OtGraphError::DeviceNotFound(id))
    }

    /// Connections of a known device.
    pub fn device_connections(&self, id: DeviceId) -> Result<Vec<&Connection>, OtGraphError> {
        self.device(id)?;
        Ok(self.topology.device_connections(id))
    }

    #[must_use]
    pub fn find_path(&self, source: DeviceId, target: DeviceId) -> Option<Vec<DeviceId>> {
        self.topology.find_path(source, target)
    }

    #[must_use]
    pub fn build_graph(&self) -> TopologyView {
        self.topology.build_graph()
    }

    #[must_use]
    pub fn statistics(&self) -> TopologyStatistics {
        self.topology.statistics()
    }

    /// Snapshot stamped with the current time.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        self.snapshot_at(Utc::now())
    }

    #[must_use]
    pub fn snapshot_at(&self, now: DateTime<Utc>) -> Snapshot {
        self.topology.create_snapshot(now)
    }
}

// =============================================================================
// TESTS
// =============================================================================
