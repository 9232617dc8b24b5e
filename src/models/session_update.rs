use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Request payload for replacing the content of a session
#[derive(Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionUpdateRequest {
    pub content: String,
    pub user_id: String,
}

/// Response returned after a content update
#[derive(Serialize, Deserialize, ToSchema)]
pub struct SessionUpdateResponse {
    pub version: u64,
    pub diff: String,
}
