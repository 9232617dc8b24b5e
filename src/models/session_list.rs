use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{Comment, SessionSummary, SessionView};

/// Response for listing sessions, oldest first
#[derive(Serialize, Deserialize, ToSchema)]
pub struct SessionListResponse {
    pub sessions: Vec<SessionSummary>,
}

/// Response for a single session with its comments
#[derive(Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionDetailResponse {
    pub session: SessionView,
    pub comments: Vec<Comment>,
    pub collaborators_count: usize,
}
