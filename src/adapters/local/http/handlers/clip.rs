use super::super::error::ApiResult;
use super::super::AppState;
use super::{json_object, text_field};
use crate::application::orchestrator::ClipSubmission;
use crate::domain::jobs::{JobId, JobStatus};
use axum::body::Bytes;
use axum::extract::State;
use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ClipAccepted {
    pub job_id: JobId,
    pub preview_url: String,
    pub status: JobStatus,
}

pub async fn create_clip(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<Json<ClipAccepted>> {
    let body = json_object(&body)?;
    let submission = ClipSubmission {
        url: text_field(&body, "url"),
        start_time: text_field(&body, "start_time"),
        end_time: text_field(&body, "end_time"),
        quality: text_field(&body, "quality"),
    };

    let job = state.clips.submit(submission).await?;
    Ok(Json(ClipAccepted {
        preview_url: format!("/preview/{}", job.job_id),
        job_id: job.job_id,
        status: job.status,
    }))
}
