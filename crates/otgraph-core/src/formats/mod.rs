//! # Formats
//!
//! Pure byte transforms for snapshots. File I/O stays in the app layer.

mod binary;

#[cfg(feature = "crypto-hash")]
pub use binary::snapshot_fingerprint;
pub use binary::{SnapshotHeader, snapshot_from_bytes, snapshot_to_bytes};
