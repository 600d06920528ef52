use super::super::error::{ApiError, ApiResult};
use super::super::AppState;
use crate::domain::jobs::{Job, JobId, JobStatus};
use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct JobStatusResponse {
    #[serde(flatten)]
    pub job: Job,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_ready: Option<bool>,
}

pub async fn job_status(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<JobStatusResponse>> {
    let job = state
        .store
        .get(&JobId::from(job_id))
        .ok_or_else(|| ApiError::not_found("job not found"))?;

    let download_ready = (job.status == JobStatus::Completed).then_some(true);
    Ok(Json(JobStatusResponse {
        job,
        download_ready,
    }))
}
