use super::quality::Quality;
use super::video::VideoMetadata;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use uuid::Uuid;

/// Opaque job identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for JobId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for JobId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Lifecycle of a clip job. Declared in forward order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Downloading,
    Clipping,
    Completed,
    Error,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Error)
    }

    /// Only single forward steps, or a jump to `Error` from a live state.
    pub fn can_transition_to(self, next: JobStatus) -> bool {
        use JobStatus::*;
        matches!(
            (self, next),
            (Queued, Downloading)
                | (Downloading, Clipping)
                | (Clipping, Completed)
                | (Queued | Downloading | Clipping, Error)
        )
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobStatus::Queued => "queued",
            JobStatus::Downloading => "downloading",
            JobStatus::Clipping => "clipping",
            JobStatus::Completed => "completed",
            JobStatus::Error => "error",
        };
        f.write_str(s)
    }
}

/// Attempted a transition the state machine forbids.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidTransition {
    pub from: JobStatus,
    pub to: JobStatus,
}

impl fmt::Display for InvalidTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cannot move job from {} to {}", self.from, self.to)
    }
}

impl std::error::Error for InvalidTransition {}

/// Everything needed to create a job; the store assigns id, status and timestamp.
#[derive(Debug, Clone)]
pub struct NewJob {
    pub url: String,
    pub start_time: String,
    pub end_time: String,
    pub quality: Quality,
    pub video_info: VideoMetadata,
}

/// Produced output of a completed job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub path: PathBuf,
    pub filename: String,
    pub size: u64,
}

/// A clip request and its tracked lifecycle.
#[derive(Debug, Clone, Serialize)]
pub struct Job {
    pub job_id: JobId,
    pub status: JobStatus,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub url: String,
    pub start_time: String,
    pub end_time: String,
    pub quality: Quality,
    pub video_info: VideoMetadata,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
    /// Files on disk this job is responsible for.
    #[serde(skip)]
    pub artifacts: Vec<PathBuf>,
}

impl Job {
    pub fn new(job_id: JobId, draft: NewJob, created_at: DateTime<Utc>) -> Self {
        Self {
            job_id,
            status: JobStatus::Queued,
            message: "job queued for processing...".to_string(),
            created_at,
            url: draft.url,
            start_time: draft.start_time,
            end_time: draft.end_time,
            quality: draft.quality,
            video_info: draft.video_info,
            download_url: None,
            filename: None,
            file_size: None,
            artifacts: Vec::new(),
        }
    }

    pub fn advance(
        &mut self,
        next: JobStatus,
        message: impl Into<String>,
    ) -> Result<(), InvalidTransition> {
        if !self.status.can_transition_to(next) {
            return Err(InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        self.message = message.into();
        Ok(())
    }

    pub fn complete(&mut self, artifact: &Artifact) -> Result<(), InvalidTransition> {
        self.advance(JobStatus::Completed, "clip ready for download!")?;
        self.download_url = Some(format!("/download/{}", self.job_id));
        self.filename = Some(artifact.filename.clone());
        self.file_size = Some(artifact.size);
        Ok(())
    }

    pub fn fail(&mut self, message: impl Into<String>) -> Result<(), InvalidTransition> {
        self.advance(JobStatus::Error, message)
    }

    pub fn own(&mut self, path: PathBuf) {
        if !self.artifacts.contains(&path) {
            self.artifacts.push(path);
        }
    }

    pub fn disown(&mut self, path: &std::path::Path) {
        self.artifacts.retain(|p| p != path);
    }

    pub fn age(&self, now: DateTime<Utc>) -> chrono::Duration {
        now - self.created_at
    }
}
