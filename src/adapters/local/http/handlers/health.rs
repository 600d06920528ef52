use super::super::AppState;
use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: String,
    pub active_jobs: usize,
    pub total_jobs: usize,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let (active_jobs, total_jobs) = state.store.counts();
    Json(HealthResponse {
        status: "healthy",
        timestamp: Utc::now().to_rfc3339(),
        active_jobs,
        total_jobs,
    })
}
