use super::super::error::{ApiError, ApiResult};
use super::super::AppState;
use crate::application::cleanup::scan_dir;
use crate::domain::artifact::ArtifactNames;
use crate::domain::jobs::{JobId, JobStatus};
use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use std::path::PathBuf;
use tokio_util::io::ReaderStream;
use tracing::info;

pub async fn download_clip(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<Response> {
    let job_id = JobId::from(job_id);
    let job = state
        .store
        .get(&job_id)
        .ok_or_else(|| ApiError::not_found("job not found"))?;

    if job.status != JobStatus::Completed {
        return Err(ApiError::not_found("file not ready yet"));
    }

    let path = locate_clip(&state, &job_id, job.filename.as_deref())
        .await
        .ok_or_else(|| ApiError::not_found("file not found"))?;

    let file = tokio::fs::File::open(&path)
        .await
        .map_err(|_| ApiError::not_found("file not found"))?;
    info!(job_id = %job_id, file = %path.display(), "Serving download");

    let download_name = job
        .filename
        .unwrap_or_else(|| format!("clip_{}.mp4", job_id));
    let headers = [
        (header::CONTENT_TYPE, "video/mp4".to_string()),
        (header::CONTENT_DISPOSITION, content_disposition(&download_name)),
    ];
    Ok((headers, Body::from_stream(ReaderStream::new(file))).into_response())
}

/// Attachment header; non-ASCII names also get an RFC 5987 `filename*`.
fn content_disposition(name: &str) -> String {
    if name.is_ascii() {
        return format!("attachment; filename=\"{}\"", name);
    }
    let fallback: String = name
        .chars()
        .map(|c| if c.is_ascii() { c } else { '_' })
        .collect();
    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback,
        urlencoding::encode(name)
    )
}

/// The recorded filename, else the first clip in the directory for this job.
async fn locate_clip(state: &AppState, job_id: &JobId, filename: Option<&str>) -> Option<PathBuf> {
    if let Some(name) = filename {
        let path = state.download_dir.join(name);
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Some(path);
        }
    }
    let prefix = ArtifactNames::new(job_id).clip_prefix();
    scan_dir(&state.download_dir, |name| name.starts_with(&prefix))
        .await
        .ok()?
        .into_iter()
        .next()
}
