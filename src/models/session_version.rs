use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::VersionRecord;

/// Response for the version history of a session
#[derive(Serialize, Deserialize, ToSchema)]
pub struct VersionListResponse {
    pub versions: Vec<VersionRecord>,
}

/// Request payload for restoring an earlier version
#[derive(Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VersionRestoreRequest {
    pub user_id: String,
}

/// Response returned after a restore
#[derive(Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VersionRestoreResponse {
    pub version: u64,
    pub restored_from: u64,
    pub message: String,
}
