use crate::domain::video::RawVideoInfo;
use crate::error::MediaResult;
use async_trait::async_trait;
use std::path::Path;

/// Extracts metadata for, and downloads, remote videos.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SourceResolver: Send + Sync {
    /// Metadata-only lookup; nothing is downloaded.
    async fn fetch_info(&self, url: &str) -> MediaResult<RawVideoInfo>;

    /// Download `url` using a format selector.
    /// `output_template` may contain `%(ext)s`, filled in by the resolver.
    async fn download(
        &self,
        url: &str,
        format_selector: &str,
        output_template: &Path,
    ) -> MediaResult<()>;
}
