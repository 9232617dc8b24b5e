use crate::{models::{ErrorResponse, SessionDetailResponse, SessionListResponse}, AppState};
use axum::{extract::{Path, State}, http::StatusCode, Json};
use std::sync::Arc;
use tracing::debug;

/// List all live sessions, oldest first
pub async fn list_sessions(
    State(app_state): State<Arc<AppState>>,
) -> Result<(StatusCode, Json<SessionListResponse>), (StatusCode, Json<ErrorResponse>)> {
    let sessions = app_state.registry.list().await;
    debug!("Listing {} sessions", sessions.len());
    Ok((StatusCode::OK, Json(SessionListResponse { sessions })))
}

/// Get one session with its comments
pub async fn get_session(
    State(app_state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<(StatusCode, Json<SessionDetailResponse>), (StatusCode, Json<ErrorResponse>)> {

    let (session, comments) = app_state.registry.detail(&session_id).await?;

    Ok((
        StatusCode::OK,
        Json(SessionDetailResponse {
            collaborators_count: session.collaborators.len(),
            session,
            comments,
        }),
    ))
}
