use crate::{handlers::require_field, models::{ErrorResponse, SessionCreateRequest, SessionCreateResponse}, AppState};
use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

/// Create a document session
pub async fn create_session(
    State(app_state): State<Arc<AppState>>,
    Json(request): Json<SessionCreateRequest>,
) -> Result<(StatusCode, Json<SessionCreateResponse>), (StatusCode, Json<ErrorResponse>)> {

    require_field("creatorId", &request.creator_id)?;
    require_field("title", &request.title)?;

    let session = app_state
        .registry
        .create(&request.title, &request.language, &request.creator_id)
        .await;

    Ok((
        StatusCode::CREATED,
        Json(SessionCreateResponse {
            message: format!("Session '{}' created", session.id),
            session,
        }),
    ))
}
