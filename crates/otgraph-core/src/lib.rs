//! # otgraph-core
//!
//! The deterministic discovery engine for otgraph - THE LOGIC.
//!
//! This crate turns noisy per-source telemetry about industrial-control
//! devices into canonical device identities, and keeps the live
//! device/connection topology those devices form.
//!
//! ## Components
//!
//! - `correlator`: entity resolution (clustering, priority+recency merge,
//!   identity indices, confidence scoring)
//! - `topology`: the graph store (canonical edges, BFS paths)
//! - `layout`, `snapshot`, `stats`: read-only projections of the topology
//! - `formats`: binary snapshot codec
//! - `session`: one correlator and one topology sharing a lifetime
//!
//! ## Architectural Constraints
//!
//! The CORE:
//! - Has NO async, NO network, NO logging dependencies (pure Rust)
//! - Performs no I/O and never retries; callers own persistence and timeouts
//! - Is deterministic: `BTreeMap`/`BTreeSet` only, integer arithmetic only
//! - Is single-writer: methods take `&mut self`, callers own locking

// =============================================================================
// MODULES
// =============================================================================

pub mod classification;
pub mod confidence;
pub mod config;
pub mod correlator;
pub mod formats;
pub mod identity;
pub mod layout;
pub mod primitives;
pub mod session;
pub mod snapshot;
pub mod stats;
pub mod topology;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{
    CandidateObservation, Connection, ConnectionId, ConnectionType, CorrelationKey, Device,
    DeviceId, DeviceStatus, DeviceType, EdgeKey, InterfaceStatus, MetaValue, Metadata,
    NetworkInterface, OtGraphError, PurdueLevel, SecurityZone,
};

// =============================================================================
// RE-EXPORTS: Engine
// =============================================================================

pub use confidence::ConfidenceScore;
pub use config::CorrelatorConfig;
pub use correlator::{CorrelationResult, Correlator};
pub use identity::{IdentityIndex, candidates_match, normalize_mac};
pub use layout::{GraphEdge, GraphNode, LevelGroup, Position, TopologyView};
pub use session::Session;
pub use snapshot::{Snapshot, SnapshotMetadata, ZoneDefinition};
pub use stats::TopologyStatistics;
pub use topology::{ConnectionUpsert, Topology};

// =============================================================================
// RE-EXPORTS: Formats (from formats module)
// =============================================================================

#[cfg(feature = "crypto-hash")]
pub use formats::snapshot_fingerprint;
pub use formats::{SnapshotHeader, snapshot_from_bytes, snapshot_to_bytes};
