use crate::{
    handlers::require_field,
    models::{ErrorResponse, VersionListResponse, VersionRestoreRequest, VersionRestoreResponse},
    AppState,
};
use axum::{extract::{Path, State}, http::StatusCode, Json};
use std::sync::Arc;
use tracing::info;

/// Version history of a session, oldest first
pub async fn list_versions(
    State(app_state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<(StatusCode, Json<VersionListResponse>), (StatusCode, Json<ErrorResponse>)> {
    let versions = app_state.registry.versions(&session_id).await?;
    Ok((StatusCode::OK, Json(VersionListResponse { versions })))
}

/// Restore an earlier version as a new version
pub async fn restore_version(
    State(app_state): State<Arc<AppState>>,
    Path((session_id, version)): Path<(String, u64)>,
    Json(request): Json<VersionRestoreRequest>,
) -> Result<(StatusCode, Json<VersionRestoreResponse>), (StatusCode, Json<ErrorResponse>)> {

    require_field("userId", &request.user_id)?;

    let new_version = app_state
        .registry
        .restore_version(&session_id, version, &request.user_id)
        .await?;
    info!(session_id = %session_id, restored_from = version, new_version, "version restored");

    Ok((
        StatusCode::OK,
        Json(VersionRestoreResponse {
            version: new_version,
            restored_from: version,
            message: format!("Restored version {} as version {}", version, new_version),
        }),
    ))
}
