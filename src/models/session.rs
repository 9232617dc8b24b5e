use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Whether a session is backed by a durable document or is a throwaway coding room.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SessionKind {
    /// Created explicitly, survives with zero live connections.
    Document,
    /// Created by the first join, pruned once the last connection leaves.
    Room,
}

/// Full view of a session as returned by `getSession`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub id: String,
    pub kind: SessionKind,
    pub title: String,
    pub language: String,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub content: String,
    pub version: u64,
    pub collaborators: Vec<String>,
    pub participants: Vec<String>,
}

/// One entry of `listSessions`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub id: String,
    pub kind: SessionKind,
    pub title: String,
    pub language: String,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub version: u64,
    pub collaborators_count: usize,
    pub participants_count: usize,
}

/// Content handed to a client the moment it joins.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub session_id: String,
    pub title: String,
    pub language: String,
    pub content: String,
    pub version: u64,
    pub collaborators: Vec<String>,
    pub participants: Vec<String>,
}
