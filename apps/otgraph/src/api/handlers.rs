//! # API Endpoint Handlers
//!
//! This module implements the actual HTTP endpoint handlers.

use super::{
    AppState,
    types::{
        ClassificationRequest, ConnectionRequest, ConnectionResponse, DeviceConnectionsResponse,
        DevicesResponse, ErrorResponse, ExportResponse, HealthResponse, IngestRequest,
        IngestResponse, PathRequest, PathResponse, SnapshotResponse,
    },
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use otgraph_core::{
    ConnectionUpsert, DeviceId, OtGraphError, snapshot_fingerprint, snapshot_to_bytes,
};

/// HTTP status for a core error.
fn error_status(error: &OtGraphError) -> StatusCode {
    match error {
        OtGraphError::InvalidId(_)
        | OtGraphError::InvalidRequest(_)
        | OtGraphError::InvalidConfig(_) => StatusCode::BAD_REQUEST,
        OtGraphError::DeviceNotFound(_) => StatusCode::NOT_FOUND,
        OtGraphError::SerializationError(_)
        | OtGraphError::DeserializationError(_)
        | OtGraphError::IoError(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(error: &OtGraphError) -> Response {
    (error_status(error), Json(ErrorResponse::new(error.to_string()))).into_response()
}

// =============================================================================
// HEALTH HANDLER
// =============================================================================

/// Health check endpoint.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

// =============================================================================
// INGESTION HANDLERS
// =============================================================================

/// Correlate a batch of candidate observations into the topology.
pub async fn ingest_handler(
    State(state): State<AppState>,
    Json(request): Json<IngestRequest>,
) -> impl IntoResponse {
    if let Err(e) = request.validate() {
        return (
            StatusCode::BAD_REQUEST,
            Json(IngestResponse::error(e.to_string())),
        );
    }

    let mut session = state.session.write().await;
    let response = IngestResponse::success(session.ingest(&request.observations));
    tracing::info!(
        observations = request.observations.len(),
        created = response.created,
        updated = response.updated,
        devices = session.topology().device_count(),
        "Observations correlated"
    );
    (StatusCode::OK, Json(response))
}

/// Insert or refresh one connection.
pub async fn connection_handler(
    State(state): State<AppState>,
    Json(request): Json<ConnectionRequest>,
) -> impl IntoResponse {
    let connection = match request.to_connection(Utc::now()) {
        Ok(c) => c,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ConnectionResponse::error(e.to_string())),
            );
        }
    };
    let key = connection.key();

    let mut session = state.session.write().await;
    let created = session.add_connection(connection) == ConnectionUpsert::Created;
    match session.topology().connection(key.low(), key.high()) {
        Some(stored) => {
            tracing::debug!(
                connection = %stored.id,
                created,
                "Connection upserted"
            );
            (
                StatusCode::OK,
                Json(ConnectionResponse::success(stored.clone(), created)),
            )
        }
        None => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ConnectionResponse::error("Connection missing after upsert")),
        ),
    }
}

/// Apply an external classifier's Purdue level and zone to a device.
pub async fn classification_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<ClassificationRequest>,
) -> Response {
    let id: DeviceId = match id.parse() {
        Ok(id) => id,
        Err(e) => return error_response(&e),
    };

    let mut session = state.session.write().await;
    match session.reclassify(id, request.purdue_level, request.zone()) {
        Ok(device) => {
            tracing::info!(
                device = %id,
                level = device.purdue_level.label(),
                "Device reclassified"
            );
            (StatusCode::OK, Json(device.clone())).into_response()
        }
        Err(e) => error_response(&e),
    }
}

/// Drop all devices and connections from the topology.
pub async fn clear_handler(State(state): State<AppState>) -> impl IntoResponse {
    let mut session = state.session.write().await;
    session.clear();
    tracing::info!("Topology cleared");
    StatusCode::NO_CONTENT
}

// =============================================================================
// DEVICE HANDLERS
// =============================================================================

/// List all devices, ordered by id.
pub async fn devices_handler(State(state): State<AppState>) -> impl IntoResponse {
    let session = state.session.read().await;
    let devices: Vec<_> = session.topology().devices().cloned().collect();
    Json(DevicesResponse {
        count: devices.len(),
        devices,
    })
}

/// One device by id.
pub async fn device_handler(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let id: DeviceId = match id.parse() {
        Ok(id) => id,
        Err(e) => return error_response(&e),
    };

    let session = state.session.read().await;
    match session.device(id) {
        Ok(device) => (StatusCode::OK, Json(device.clone())).into_response(),
        Err(e) => error_response(&e),
    }
}

/// Connections touching one device.
pub async fn device_connections_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Response {
    let id: DeviceId = match id.parse() {
        Ok(id) => id,
        Err(e) => return error_response(&e),
    };

    let session = state.session.read().await;
    match session.device_connections(id) {
        Ok(connections) => {
            let connections: Vec<_> = connections.into_iter().cloned().collect();
            (
                StatusCode::OK,
                Json(DeviceConnectionsResponse {
                    device_id: id,
                    count: connections.len(),
                    connections,
                }),
            )
                .into_response()
        }
        Err(e) => error_response(&e),
    }
}

// =============================================================================
// QUERY HANDLERS
// =============================================================================

/// Shortest hop path between two devices.
pub async fn path_handler(
    State(state): State<AppState>,
    Json(request): Json<PathRequest>,
) -> impl IntoResponse {
    let ids = request
        .source
        .parse::<DeviceId>()
        .and_then(|s| request.target.parse::<DeviceId>().map(|t| (s, t)));
    let (source, target) = match ids {
        Ok(pair) => pair,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(PathResponse::error(e.to_string())),
            );
        }
    };

    let session = state.session.read().await;
    (
        StatusCode::OK,
        Json(PathResponse::from_path(session.find_path(source, target))),
    )
}

/// Positioned view of the topology for rendering.
pub async fn graph_handler(State(state): State<AppState>) -> impl IntoResponse {
    let session = state.session.read().await;
    Json(session.build_graph())
}

/// Device and connection counts.
pub async fn stats_handler(State(state): State<AppState>) -> impl IntoResponse {
    let session = state.session.read().await;
    Json(session.statistics())
}

// =============================================================================
// SNAPSHOT HANDLERS
// =============================================================================

/// Full snapshot as JSON, with its fingerprint.
pub async fn snapshot_handler(State(state): State<AppState>) -> Response {
    let snapshot = state.session.read().await.snapshot();

    match snapshot_fingerprint(&snapshot) {
        Ok(fingerprint) => (
            StatusCode::OK,
            Json(SnapshotResponse {
                fingerprint,
                snapshot,
            }),
        )
            .into_response(),
        Err(e) => error_response(&e),
    }
}

/// Binary snapshot, base64-encoded.
pub async fn export_handler(State(state): State<AppState>) -> impl IntoResponse {
    let snapshot = state.session.read().await.snapshot();

    let encoded = snapshot_to_bytes(&snapshot)
        .and_then(|bytes| snapshot_fingerprint(&snapshot).map(|hash| (bytes, hash)));
    match encoded {
        Ok((data, fingerprint)) => {
            tracing::info!(bytes = data.len(), %fingerprint, "Snapshot exported");
            (
                StatusCode::OK,
                Json(ExportResponse::success(data, fingerprint)),
            )
        }
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ExportResponse::error(format!("Export failed: {}", e))),
        ),
    }
}
