use crate::{handlers::require_field, models::{ErrorResponse, SessionDeleteQuery, SessionDeleteResponse}, AppState};
use axum::{extract::{Path, Query, State}, http::StatusCode, Json};
use std::sync::Arc;

/// Delete a session. Only its creator may do so; live connections are evicted.
pub async fn delete_session(
    State(app_state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    Query(query): Query<SessionDeleteQuery>,
) -> Result<(StatusCode, Json<SessionDeleteResponse>), (StatusCode, Json<ErrorResponse>)> {

    require_field("userId", &query.user_id)?;

    let evicted_connections = app_state.registry.delete(&session_id, &query.user_id).await?;

    Ok((
        StatusCode::OK,
        Json(SessionDeleteResponse {
            success: true,
            evicted_connections,
        }),
    ))
}
