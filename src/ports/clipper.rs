use crate::error::MediaResult;
use async_trait::async_trait;
use std::path::PathBuf;

/// A trim + re-encode of a local media file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipRequest {
    pub input: PathBuf,
    pub output: PathBuf,
    /// Offset into the input, in seconds.
    pub start: u64,
    /// Length of the clip, in seconds.
    pub duration: u64,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Clipper: Send + Sync {
    /// Write the clip to `request.output`, overwriting it.
    /// Fails with the collaborator's stderr on a nonzero exit.
    async fn clip(&self, request: &ClipRequest) -> MediaResult<()>;
}
