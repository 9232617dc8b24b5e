use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A remark attached to a line of a document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub document_id: String,
    pub line: u32,
    pub text: String,
    pub user_id: String,
    pub username: String,
    pub timestamp: DateTime<Utc>,
    pub resolved: bool,
}
