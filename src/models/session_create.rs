use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::SessionView;

/// Request payload for creating a document session
#[derive(Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionCreateRequest {
    pub title: String,
    pub language: String,
    pub creator_id: String,
}

/// Response returned after creating a document session
#[derive(Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionCreateResponse {
    pub session: SessionView,
    pub message: String,
}
