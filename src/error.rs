use axum::{http::StatusCode, Json};
use thiserror::Error;

use crate::models::ErrorResponse;

/// Result type for session operations.
pub type ColabResult<T> = std::result::Result<T, ColabError>;

/// Errors raised by the session core.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ColabError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Malformed message: {0}")]
    Malformed(String),

    #[error("Transport failure for connection {0}")]
    TransportFailure(u64),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ColabError {
    pub fn session_not_found(session_id: &str) -> Self {
        ColabError::NotFound(format!("Session '{}'", session_id))
    }

    /// Short machine-readable tag sent to socket clients.
    pub fn kind(&self) -> &'static str {
        match self {
            ColabError::NotFound(_) => "not_found",
            ColabError::Forbidden(_) => "forbidden",
            ColabError::Malformed(_) => "malformed",
            ColabError::TransportFailure(_) => "transport_failure",
            ColabError::Internal(_) => "internal",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ColabError::NotFound(_) => StatusCode::NOT_FOUND,
            ColabError::Forbidden(_) => StatusCode::FORBIDDEN,
            ColabError::Malformed(_) => StatusCode::BAD_REQUEST,
            ColabError::TransportFailure(_) => StatusCode::BAD_GATEWAY,
            ColabError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<serde_json::Error> for ColabError {
    fn from(e: serde_json::Error) -> Self {
        ColabError::Malformed(e.to_string())
    }
}

impl From<ColabError> for (StatusCode, Json<ErrorResponse>) {
    fn from(e: ColabError) -> Self {
        let status = e.status_code();
        (status, Json(ErrorResponse {
            code: status.as_u16(),
            status: status.to_string(),
            error: e.to_string(),
        }))
    }
}
