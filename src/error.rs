//! Error taxonomy shared by the domain, the ports and the application services.

use thiserror::Error;

/// Result type for collaborator (resolver / clipper) calls.
pub type MediaResult<T> = Result<T, MediaError>;

/// Rejections produced by the time range validator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Invalid time format: {0}")]
    InvalidFormat(String),

    #[error("{0}")]
    InvalidRange(&'static str),

    #[error("Clip duration cannot exceed 10 minutes")]
    DurationExceeded { requested: u64, max: u64 },
}

/// Metadata could not be obtained from the source resolver.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("could not fetch video information: {0}")]
    ResolutionFailed(String),
}

/// Synchronous rejections of an incoming request.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("url is required")]
    UrlRequired,

    #[error("missing required fields")]
    MissingFields,

    #[error("please provide a valid youtube url")]
    UnsupportedUrl,

    #[error("could not fetch video information")]
    Resolve(#[source] ResolveError),

    #[error("quality {0} not available for this video")]
    QualityUnavailable(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Failures reported by the external collaborators.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("{0} not found in PATH")]
    BinaryNotFound(String),

    #[error("{program} exited with status {exit_code:?}: {stderr}")]
    ProcessFailed {
        program: String,
        stderr: String,
        exit_code: Option<i32>,
    },

    #[error("Operation timed out after {0} seconds")]
    Timeout(u64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl MediaError {
    pub fn process_failed(
        program: impl Into<String>,
        stderr: impl Into<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Self::ProcessFailed {
            program: program.into(),
            stderr: stderr.into(),
            exit_code,
        }
    }

    /// What the collaborator itself said went wrong.
    pub fn cause(&self) -> String {
        match self {
            MediaError::ProcessFailed { stderr, .. } => stderr.trim().to_string(),
            other => other.to_string(),
        }
    }
}

/// Failures of a running job. `Display` is the message stored on the job record.
#[derive(Debug, Error)]
pub enum JobError {
    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Downloaded file not found")]
    DownloadMissing,

    #[error(transparent)]
    InvalidRange(#[from] ValidationError),

    #[error("Video processing failed: {0}")]
    ClippingFailed(String),

    #[error("Output file was not created")]
    OutputMissing,

    #[error("Output file is too small - processing may have failed")]
    OutputTooSmall { size: u64 },

    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),
}
