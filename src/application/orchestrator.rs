use super::metadata::MetadataService;
use super::worker::JobExecutor;
use crate::domain::jobs::{Job, NewJob};
use crate::domain::quality::Quality;
use crate::domain::timecode::validate_time_range;
use crate::domain::video::{is_supported_url, VideoMetadata};
use crate::error::SubmitError;
use crate::ports::repository::JobRepository;
use std::sync::Arc;
use tracing::info;

/// A clip request as received from the client. Every field is trimmed before use.
#[derive(Debug, Clone)]
pub struct ClipSubmission {
    pub url: String,
    pub start_time: String,
    pub end_time: String,
    pub quality: String,
}

/// Accepts requests, validates them synchronously and hands accepted jobs to
/// the executor.
pub struct ClipService {
    metadata: MetadataService,
    store: Arc<dyn JobRepository>,
    executor: Arc<JobExecutor>,
}

impl ClipService {
    pub fn new(
        metadata: MetadataService,
        store: Arc<dyn JobRepository>,
        executor: Arc<JobExecutor>,
    ) -> Self {
        Self {
            metadata,
            store,
            executor,
        }
    }

    pub async fn video_info(&self, url: &str) -> Result<VideoMetadata, SubmitError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(SubmitError::UrlRequired);
        }
        if !is_supported_url(url) {
            return Err(SubmitError::UnsupportedUrl);
        }
        self.metadata.resolve(url).await.map_err(SubmitError::Resolve)
    }

    /// Validate the request, record a `queued` job and start it. Nothing is
    /// recorded when validation fails.
    pub async fn submit(&self, request: ClipSubmission) -> Result<Job, SubmitError> {
        let url = request.url.trim();
        let start_time = request.start_time.trim();
        let end_time = request.end_time.trim();
        let quality = request.quality.trim();

        info!(url, start_time, end_time, quality, "Clip request received");

        if [url, start_time, end_time, quality]
            .iter()
            .any(|field| field.is_empty())
        {
            return Err(SubmitError::MissingFields);
        }
        if !is_supported_url(url) {
            return Err(SubmitError::UnsupportedUrl);
        }

        let video_info = self
            .metadata
            .resolve(url)
            .await
            .map_err(SubmitError::Resolve)?;

        let quality = match quality.parse::<Quality>() {
            Ok(q) if video_info.offers(q) => q,
            _ => return Err(SubmitError::QualityUnavailable(quality.to_string())),
        };

        validate_time_range(start_time, end_time, video_info.duration)?;

        let job = self.store.create(NewJob {
            url: url.to_string(),
            start_time: start_time.to_string(),
            end_time: end_time.to_string(),
            quality,
            video_info,
        });
        info!(job_id = %job.job_id, "Created job");

        self.executor.spawn(job.job_id.clone());
        Ok(job)
    }
}
