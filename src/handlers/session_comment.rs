use crate::{
    handlers::require_field,
    models::{
        Comment, CommentAddRequest, CommentListResponse, CommentResolveRequest,
        CommentResolveResponse, ErrorResponse,
    },
    AppState,
};
use axum::{extract::{Path, State}, http::StatusCode, Json};
use std::sync::Arc;

/// Comments of a session in insertion order
pub async fn list_comments(
    State(app_state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<(StatusCode, Json<CommentListResponse>), (StatusCode, Json<ErrorResponse>)> {
    let comments = app_state.registry.comments(&session_id).await?;
    Ok((StatusCode::OK, Json(CommentListResponse { comments })))
}

/// Attach a comment to a line
pub async fn add_comment(
    State(app_state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    Json(request): Json<CommentAddRequest>,
) -> Result<(StatusCode, Json<Comment>), (StatusCode, Json<ErrorResponse>)> {

    require_field("userId", &request.user_id)?;

    let comment = app_state
        .registry
        .add_comment(
            &session_id,
            &request.user_id,
            request.line,
            &request.text,
            request.username.as_deref(),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(comment)))
}

/// Mark a comment resolved. Resolving twice is fine; the body is optional.
pub async fn resolve_comment(
    State(app_state): State<Arc<AppState>>,
    Path((session_id, comment_id)): Path<(String, String)>,
    request: Option<Json<CommentResolveRequest>>,
) -> Result<(StatusCode, Json<CommentResolveResponse>), (StatusCode, Json<ErrorResponse>)> {

    let user_id = request
        .and_then(|Json(request)| request.user_id)
        .filter(|user_id| !user_id.trim().is_empty());

    app_state
        .registry
        .resolve_comment(&session_id, &comment_id, user_id.as_deref())
        .await?;

    Ok((StatusCode::OK, Json(CommentResolveResponse { success: true })))
}
