use utoipa::OpenApi;
use crate::models::*;
use crate::ws::handler::JoinQuery;

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    )
)]
#[allow(dead_code)]
pub async fn health_check_doc() {}

/// Readiness check endpoint
#[utoipa::path(
    get,
    path = "/api/ready",
    responses(
        (status = 200, description = "Service is ready", body = ReadyResponse)
    )
)]
#[allow(dead_code)]
pub async fn ready_check_doc() {}

#[utoipa::path(
    get,
    path = "/api/v1/diagnostics",
    responses(
        (status = 200, description = "Session and process statistics", body = DiagnosticsResponse)
    )
)]
#[allow(dead_code)]
pub async fn diagnostics_doc() {}

/// Create a document session
#[utoipa::path(
    post,
    path = "/api/v1/sessions",
    request_body = SessionCreateRequest,
    responses(
        (status = 201, description = "Session created", body = SessionCreateResponse),
        (status = 400, description = "Missing creator or title", body = ErrorResponse)
    )
)]
#[allow(dead_code)]
pub async fn create_session_doc() {}

/// List sessions in creation order
#[utoipa::path(
    get,
    path = "/api/v1/sessions",
    responses(
        (status = 200, description = "All live sessions", body = SessionListResponse)
    )
)]
#[allow(dead_code)]
pub async fn list_sessions_doc() {}

#[utoipa::path(
    get,
    path = "/api/v1/sessions/{session_id}",
    params(("session_id" = String, Path, description = "Session id")),
    responses(
        (status = 200, description = "Session with comments", body = SessionDetailResponse),
        (status = 404, description = "Unknown session", body = ErrorResponse)
    )
)]
#[allow(dead_code)]
pub async fn get_session_doc() {}

/// Delete a session; only its creator may
#[utoipa::path(
    delete,
    path = "/api/v1/sessions/{session_id}",
    params(("session_id" = String, Path, description = "Session id"), SessionDeleteQuery),
    responses(
        (status = 200, description = "Session deleted", body = SessionDeleteResponse),
        (status = 403, description = "Requester is not the creator", body = ErrorResponse),
        (status = 404, description = "Unknown session", body = ErrorResponse)
    )
)]
#[allow(dead_code)]
pub async fn delete_session_doc() {}

#[utoipa::path(
    post,
    path = "/api/v1/sessions/{session_id}/update",
    params(("session_id" = String, Path, description = "Session id")),
    request_body = SessionUpdateRequest,
    responses(
        (status = 200, description = "New version and unified diff", body = SessionUpdateResponse),
        (status = 404, description = "Unknown session", body = ErrorResponse)
    )
)]
#[allow(dead_code)]
pub async fn update_session_doc() {}

#[utoipa::path(
    get,
    path = "/api/v1/sessions/{session_id}/versions",
    params(("session_id" = String, Path, description = "Session id")),
    responses(
        (status = 200, description = "Version history, oldest first", body = VersionListResponse),
        (status = 404, description = "Unknown session", body = ErrorResponse)
    )
)]
#[allow(dead_code)]
pub async fn list_versions_doc() {}

#[utoipa::path(
    post,
    path = "/api/v1/sessions/{session_id}/restore/{version}",
    params(
        ("session_id" = String, Path, description = "Session id"),
        ("version" = u64, Path, description = "Version to restore")
    ),
    request_body = VersionRestoreRequest,
    responses(
        (status = 200, description = "Version restored as a new version", body = VersionRestoreResponse),
        (status = 404, description = "Unknown session or version", body = ErrorResponse)
    )
)]
#[allow(dead_code)]
pub async fn restore_version_doc() {}

#[utoipa::path(
    get,
    path = "/api/v1/sessions/{session_id}/comments",
    params(("session_id" = String, Path, description = "Session id")),
    responses(
        (status = 200, description = "Comments in insertion order", body = CommentListResponse),
        (status = 404, description = "Unknown session", body = ErrorResponse)
    )
)]
#[allow(dead_code)]
pub async fn list_comments_doc() {}

#[utoipa::path(
    post,
    path = "/api/v1/sessions/{session_id}/comments",
    params(("session_id" = String, Path, description = "Session id")),
    request_body = CommentAddRequest,
    responses(
        (status = 201, description = "Comment added", body = Comment),
        (status = 404, description = "Unknown session", body = ErrorResponse)
    )
)]
#[allow(dead_code)]
pub async fn add_comment_doc() {}

#[utoipa::path(
    put,
    path = "/api/v1/sessions/{session_id}/comments/{comment_id}/resolve",
    params(
        ("session_id" = String, Path, description = "Session id"),
        ("comment_id" = String, Path, description = "Comment id")
    ),
    request_body = CommentResolveRequest,
    responses(
        (status = 200, description = "Comment resolved", body = CommentResolveResponse),
        (status = 404, description = "Unknown session or comment", body = ErrorResponse)
    )
)]
#[allow(dead_code)]
pub async fn resolve_comment_doc() {}

/// Join a document session over WebSocket
#[utoipa::path(
    get,
    path = "/ws/documents/{session_id}",
    params(("session_id" = String, Path, description = "Session id"), JoinQuery),
    responses(
        (status = 101, description = "Switching to the WebSocket protocol")
    )
)]
#[allow(dead_code)]
pub async fn document_socket_doc() {}

/// Join (or open) an ephemeral room over WebSocket
#[utoipa::path(
    get,
    path = "/ws/rooms/{room_id}",
    params(("room_id" = String, Path, description = "Room id"), JoinQuery),
    responses(
        (status = 101, description = "Switching to the WebSocket protocol")
    )
)]
#[allow(dead_code)]
pub async fn room_socket_doc() {}

#[derive(OpenApi)]
#[openapi(
    paths(
        health_check_doc,
        ready_check_doc,
        diagnostics_doc,
        create_session_doc,
        list_sessions_doc,
        get_session_doc,
        delete_session_doc,
        update_session_doc,
        list_versions_doc,
        restore_version_doc,
        list_comments_doc,
        add_comment_doc,
        resolve_comment_doc,
        document_socket_doc,
        room_socket_doc,
    ),
    components(
        schemas(
            HealthResponse, ReadyResponse, DiagnosticsResponse, ErrorResponse,
            SessionKind, SessionView, SessionSummary, Snapshot, VersionRecord, Comment,
            SessionCreateRequest, SessionCreateResponse, SessionListResponse, SessionDetailResponse,
            SessionDeleteResponse, SessionUpdateRequest, SessionUpdateResponse,
            VersionListResponse, VersionRestoreRequest, VersionRestoreResponse,
            CommentListResponse, CommentAddRequest, CommentResolveRequest, CommentResolveResponse
        )
    ),
    tags(
        (name = "api", description = "Collaborative session endpoints")
    )
)]
pub struct ApiDoc;
