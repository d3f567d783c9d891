//! # CLI Command Implementations
//!
//! Offline commands build a fresh [`Session`] from input files, so the same
//! files always yield the same device ids.

use crate::api::{self, ConnectionRequest, IngestRequest};
use crate::config::AppConfig;
use chrono::Utc;
use otgraph_core::{
    CandidateObservation, DeviceId, OtGraphError, Session, snapshot_fingerprint,
    snapshot_from_bytes, snapshot_to_bytes,
};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

// =============================================================================
// FILE HANDLING
// =============================================================================

/// Maximum size of an observation or connection file (100 MB).
const MAX_INPUT_FILE_SIZE: u64 = 100 * 1024 * 1024;

/// Maximum size of a binary snapshot file (500 MB).
const MAX_SNAPSHOT_FILE_SIZE: u64 = 500 * 1024 * 1024;

fn validate_file_size(path: &Path, max_size: u64) -> Result<(), OtGraphError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| OtGraphError::IoError(format!("Cannot read file metadata: {}", e)))?;

    if metadata.len() > max_size {
        return Err(OtGraphError::IoError(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            max_size
        )));
    }
    Ok(())
}

/// Canonicalize an input path and require a regular file.
fn validate_file_path(path: &Path) -> Result<PathBuf, OtGraphError> {
    let canonical = path.canonicalize().map_err(|e| {
        OtGraphError::IoError(format!("Invalid file path '{}': {}", path.display(), e))
    })?;

    if !canonical.is_file() {
        return Err(OtGraphError::IoError(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    Ok(canonical)
}

/// Canonicalize the parent of an output path and require it to be a directory.
fn validate_output_path(path: &Path) -> Result<PathBuf, OtGraphError> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let canonical_parent = parent.canonicalize().map_err(|e| {
        OtGraphError::IoError(format!(
            "Invalid output directory '{}': {}",
            parent.display(),
            e
        ))
    })?;

    if !canonical_parent.is_dir() {
        return Err(OtGraphError::IoError(format!(
            "Output directory '{}' is not a valid directory",
            parent.display()
        )));
    }

    let filename = path
        .file_name()
        .ok_or_else(|| OtGraphError::IoError("Output path has no filename".to_string()))?;

    Ok(canonical_parent.join(filename))
}

fn read_input(path: &Path, max_size: u64) -> Result<Vec<u8>, OtGraphError> {
    let validated = validate_file_path(path)?;
    validate_file_size(&validated, max_size)?;
    std::fs::read(&validated).map_err(|e| OtGraphError::IoError(format!("Read file: {}", e)))
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, OtGraphError> {
    let contents = read_input(path, MAX_INPUT_FILE_SIZE)?;
    serde_json::from_slice(&contents).map_err(|e| {
        OtGraphError::DeserializationError(format!("Invalid JSON in '{}': {}", path.display(), e))
    })
}

/// Observation files hold either a bare array or an ingest request body.
#[derive(Deserialize)]
#[serde(untagged)]
enum ObservationFile {
    Batch(Vec<CandidateObservation>),
    Request(IngestRequest),
}

/// Read and validate an observation file.
pub fn load_observations(path: &Path) -> Result<Vec<CandidateObservation>, OtGraphError> {
    let request = match read_json::<ObservationFile>(path)? {
        ObservationFile::Batch(observations) => IngestRequest { observations },
        ObservationFile::Request(request) => request,
    };
    request.validate()?;
    Ok(request.observations)
}

pub fn load_connections(path: &Path) -> Result<Vec<ConnectionRequest>, OtGraphError> {
    read_json(path)
}

// =============================================================================
// SESSION CONSTRUCTION
// =============================================================================

/// Resolve a device reference: a device id, or a MAC, IP or hostname
/// known to the identity indices.
pub fn resolve_device(session: &Session, reference: &str) -> Result<DeviceId, OtGraphError> {
    if let Ok(id) = reference.parse::<DeviceId>() {
        return Ok(id);
    }
    let correlator = session.correlator();
    correlator
        .lookup_mac(reference)
        .or_else(|| correlator.lookup_ip(reference))
        .or_else(|| correlator.lookup_hostname(reference))
        .ok_or_else(|| OtGraphError::InvalidId(reference.to_string()))
}

/// Correlate `observations` and add `connections`, whose endpoints may be
/// given by id, MAC, IP or hostname.
pub fn build_session(
    config: &AppConfig,
    observations: &Path,
    connections: Option<&Path>,
) -> Result<Session, OtGraphError> {
    let mut session = Session::new(config.correlator.clone())?;
    let batch = load_observations(observations)?;
    let results = session.ingest(&batch);
    tracing::info!(
        observations = batch.len(),
        devices = results.len(),
        "Observation file correlated"
    );

    if let Some(path) = connections {
        let now = Utc::now();
        let requests = load_connections(path)?;
        for request in &requests {
            let resolved = ConnectionRequest {
                source_id: resolve_device(&session, &request.source_id)?.to_string(),
                target_id: resolve_device(&session, &request.target_id)?.to_string(),
                ..request.clone()
            };
            session.add_connection(resolved.to_connection(now)?);
        }
        tracing::info!(
            connections = session.topology().connection_count(),
            "Connection file applied"
        );
    }

    Ok(session)
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), OtGraphError> {
    let output = serde_json::to_string_pretty(value)
        .map_err(|e| OtGraphError::SerializationError(e.to_string()))?;
    println!("{}", output);
    Ok(())
}

// =============================================================================
// SERVER COMMAND
// =============================================================================

/// Start the HTTP server.
pub async fn cmd_server(
    mut config: AppConfig,
    host: Option<String>,
    port: Option<u16>,
) -> Result<(), OtGraphError> {
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
    config.validate()?;

    let session = Session::new(config.correlator.clone())?;

    println!("otgraph Discovery Server Starting...");
    println!();
    println!("Configuration:");
    println!("  Host:            {}", config.server.host);
    println!("  Port:            {}", config.server.port);
    println!(
        "  Source priority: {}",
        config.correlator.source_priority.join(" > ")
    );
    println!("  Staleness:       {} min", config.correlator.staleness_minutes);
    println!();
    println!("Endpoints:");
    println!("  POST   /observations                 - Correlate observations");
    println!("  POST   /connections                  - Add or refresh a connection");
    println!("  GET    /devices                      - List devices");
    println!("  GET    /devices/{{id}}/connections     - Device connections");
    println!("  PUT    /devices/{{id}}/classification  - Override classification");
    println!("  POST   /path                         - Shortest path");
    println!("  GET    /graph                        - Layout view");
    println!("  GET    /snapshot                     - Snapshot with fingerprint");
    println!("  POST   /export                       - Binary snapshot");
    println!("  GET    /health                       - Health check");
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    api::run_server(&config.server.addr(), session).await
}

// =============================================================================
// CORRELATE COMMAND
// =============================================================================

pub fn cmd_correlate(config: &AppConfig, json_mode: bool, file: &Path) -> Result<(), OtGraphError> {
    let mut session = Session::new(config.correlator.clone())?;
    let batch = load_observations(file)?;
    let results = session.ingest(&batch);

    if json_mode {
        return print_json(&results);
    }

    println!(
        "Correlated {} observations into {} devices",
        batch.len(),
        results.len()
    );
    println!();
    for result in &results {
        let device = &result.device;
        println!("{}  {}", device.id, device.name);
        println!(
            "    type: {:?}  level: {}  confidence: {}",
            device.device_type,
            device.purdue_level.label(),
            result.confidence
        );
        println!("    sources: {}", result.sources.join(", "));
        let ips: Vec<_> = device.ip_addresses().collect();
        if !ips.is_empty() {
            println!("    ip: {}", ips.join(", "));
        }
    }
    Ok(())
}

// =============================================================================
// SNAPSHOT COMMANDS
// =============================================================================

pub fn cmd_snapshot(
    config: &AppConfig,
    file: &Path,
    connections: Option<&Path>,
    output: &Path,
    format: &str,
) -> Result<(), OtGraphError> {
    let validated_output = validate_output_path(output)?;
    let session = build_session(config, file, connections)?;
    let snapshot = session.snapshot();

    let data = match format {
        "binary" => snapshot_to_bytes(&snapshot)?,
        "json" => serde_json::to_vec_pretty(&snapshot)
            .map_err(|e| OtGraphError::SerializationError(e.to_string()))?,
        _ => {
            return Err(OtGraphError::InvalidConfig(format!(
                "Unknown format: {}. Use: json, binary",
                format
            )));
        }
    };

    std::fs::write(&validated_output, &data)
        .map_err(|e| OtGraphError::IoError(format!("Write file: {}", e)))?;

    println!("Fingerprint: {}", snapshot_fingerprint(&snapshot)?);
    println!(
        "Wrote {} devices, {} connections ({} bytes) to {:?}",
        snapshot.metadata.device_count,
        snapshot.metadata.connection_count,
        data.len(),
        validated_output
    );
    Ok(())
}

pub fn cmd_inspect(json_mode: bool, input: &Path) -> Result<(), OtGraphError> {
    let data = read_input(input, MAX_SNAPSHOT_FILE_SIZE)?;
    let snapshot = snapshot_from_bytes(&data)?;
    let fingerprint = snapshot_fingerprint(&snapshot)?;

    if json_mode {
        return print_json(&serde_json::json!({
            "fingerprint": fingerprint,
            "metadata": snapshot.metadata,
            "zones": snapshot.zones,
        }));
    }

    println!("otgraph Snapshot");
    println!("================");
    println!("Fingerprint: {}", fingerprint);
    println!("Created:     {}", snapshot.metadata.created_at);
    println!("Devices:     {}", snapshot.metadata.device_count);
    println!("Connections: {}", snapshot.metadata.connection_count);
    println!("Sources:     {}", snapshot.metadata.sources.join(", "));
    println!();
    println!("Zones:");
    for zone in &snapshot.zones {
        println!(
            "  {:<10} {:>4} devices  {}",
            zone.name,
            zone.devices.len(),
            zone.subnets.join(", ")
        );
    }
    Ok(())
}

// =============================================================================
// QUERY COMMANDS
// =============================================================================

pub fn cmd_path(
    config: &AppConfig,
    json_mode: bool,
    file: &Path,
    connections: &Path,
    from: &str,
    to: &str,
) -> Result<(), OtGraphError> {
    let session = build_session(config, file, Some(connections))?;
    let source = resolve_device(&session, from)?;
    let target = resolve_device(&session, to)?;
    let response = api::PathResponse::from_path(session.find_path(source, target));

    if json_mode {
        return print_json(&response);
    }

    if !response.found {
        println!("No path from {} to {}", from, to);
        return Ok(());
    }
    println!("Path ({} hops):", response.hops);
    for id in &response.path {
        let name = session.device(*id).map(|d| d.name.as_str()).unwrap_or("?");
        println!("  {}  {}", id, name);
    }
    Ok(())
}

pub fn cmd_stats(
    config: &AppConfig,
    json_mode: bool,
    file: &Path,
    connections: Option<&Path>,
) -> Result<(), OtGraphError> {
    let session = build_session(config, file, connections)?;
    let stats = session.statistics();

    if json_mode {
        return print_json(&stats);
    }

    println!("otgraph Topology Statistics");
    println!("===========================");
    println!("Devices:            {}", stats.device_count);
    println!("Connections:        {}", stats.connection_count);
    println!("Secure connections: {}", stats.secure_connection_count);
    println!();
    println!("By level:");
    for (level, count) in &stats.by_level {
        println!("  {:<8} {}", level.label(), count);
    }
    println!("By status:");
    for (status, count) in &stats.by_status {
        println!("  {:<8} {}", format!("{:?}", status), count);
    }
    Ok(())
}

pub fn cmd_config(config: &AppConfig) -> Result<(), OtGraphError> {
    print_json(config)
}
