use crate::{handlers::*, ws::handler::{document_socket, room_socket}, AppState};
use axum::{routing::{get, post, put}, Router};
use std::sync::Arc;

/// Create API routes
pub fn create_api_routes() -> Router<Arc<AppState>> {
    Router::<Arc<AppState>>::new()
        .route("/health", get(health_check))
        .route("/ready", get(ready_check))
        .route("/v1/diagnostics", get(diagnostics))
        .route("/v1/sessions", post(create_session).get(list_sessions))
        .route("/v1/sessions/:session_id", get(get_session).delete(delete_session))
        .route("/v1/sessions/:session_id/update", post(update_session))
        .route("/v1/sessions/:session_id/versions", get(list_versions))
        .route("/v1/sessions/:session_id/restore/:version", post(restore_version))
        .route("/v1/sessions/:session_id/comments", get(list_comments).post(add_comment))
        .route("/v1/sessions/:session_id/comments/:comment_id/resolve", put(resolve_comment))
}

/// Create WebSocket routes
pub fn create_ws_routes() -> Router<Arc<AppState>> {
    Router::<Arc<AppState>>::new()
        .route("/documents/:session_id", get(document_socket))
        .route("/rooms/:room_id", get(room_socket))
}
