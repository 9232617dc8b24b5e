use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::Comment;

/// Response for the comments of a session
#[derive(Serialize, Deserialize, ToSchema)]
pub struct CommentListResponse {
    pub comments: Vec<Comment>,
}

/// Request payload for adding a comment to a line
#[derive(Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommentAddRequest {
    pub line: u32,
    pub text: String,
    pub user_id: String,
    pub username: Option<String>,
}

/// Optional request payload for resolving a comment
#[derive(Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommentResolveRequest {
    #[serde(default)]
    pub user_id: Option<String>,
}

/// Response returned after resolving a comment
#[derive(Serialize, Deserialize, ToSchema)]
pub struct CommentResolveResponse {
    pub success: bool,
}
