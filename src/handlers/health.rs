use axum::{extract::State, Json};
use std::sync::Arc;
use crate::{models::{HealthResponse, ReadyResponse}, AppState};
use tracing::debug;

/// Health check endpoint
pub async fn health_check(State(app_state): State<Arc<AppState>>) -> Json<HealthResponse> {
    debug!("Health check requested");
    Json(HealthResponse {
        status: "ok".to_string(),
        service: app_state.config.service_name.clone(),
    })
}

/// Readiness check endpoint
pub async fn ready_check(State(app_state): State<Arc<AppState>>) -> Json<ReadyResponse> {
    debug!("Readiness check requested");
    let stats = app_state.registry.stats().await;
    Json(ReadyResponse {
        status: "ready".to_string(),
        sessions: stats.sessions,
    })
}
