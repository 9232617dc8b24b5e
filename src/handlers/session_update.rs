use crate::{handlers::require_field, models::{ErrorResponse, SessionUpdateRequest, SessionUpdateResponse}, AppState};
use axum::{extract::{Path, State}, http::StatusCode, Json};
use std::sync::Arc;

/// Replace the content of a session, the same way a socket `content_change` does
pub async fn update_session(
    State(app_state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    Json(request): Json<SessionUpdateRequest>,
) -> Result<(StatusCode, Json<SessionUpdateResponse>), (StatusCode, Json<ErrorResponse>)> {

    require_field("userId", &request.user_id)?;

    let update = app_state
        .registry
        .update_content(&session_id, &request.user_id, &request.content)
        .await?;

    Ok((
        StatusCode::OK,
        Json(SessionUpdateResponse {
            version: update.version,
            diff: update.diff,
        }),
    ))
}
