//! `SourceResolver` backed by the yt-dlp command line.

use crate::domain::video::RawVideoInfo;
use crate::error::{MediaError, MediaResult};
use crate::ports::resolver::SourceResolver;
use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use tokio::process::Command;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct YtDlpResolver {
    bin: PathBuf,
}

impl YtDlpResolver {
    pub fn new(bin: impl Into<PathBuf>) -> Self {
        Self { bin: bin.into() }
    }

    fn info_args(url: &str) -> Vec<String> {
        [
            "--dump-single-json",
            "--skip-download",
            "--no-playlist",
            "--no-warnings",
            "--quiet",
            url,
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }

    fn download_args(url: &str, format_selector: &str, output_template: &Path) -> Vec<String> {
        vec![
            "--format".to_string(),
            format_selector.to_string(),
            "--output".to_string(),
            output_template.to_string_lossy().into_owned(),
            "--no-playlist".to_string(),
            "--no-warnings".to_string(),
            "--quiet".to_string(),
            url.to_string(),
        ]
    }

    async fn run(&self, args: &[String]) -> MediaResult<Output> {
        let output = Command::new(&self.bin)
            .args(args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| match e.kind() {
                io::ErrorKind::NotFound => {
                    MediaError::BinaryNotFound(self.bin.display().to_string())
                }
                _ => MediaError::Io(e),
            })?;

        if !output.status.success() {
            return Err(MediaError::process_failed(
                "yt-dlp",
                String::from_utf8_lossy(&output.stderr),
                output.status.code(),
            ));
        }
        Ok(output)
    }
}

impl Default for YtDlpResolver {
    fn default() -> Self {
        Self::new("yt-dlp")
    }
}

#[async_trait]
impl SourceResolver for YtDlpResolver {
    async fn fetch_info(&self, url: &str) -> MediaResult<RawVideoInfo> {
        debug!(url, "Fetching video info");
        let output = self.run(&Self::info_args(url)).await?;
        Ok(serde_json::from_slice(&output.stdout)?)
    }

    async fn download(
        &self,
        url: &str,
        format_selector: &str,
        output_template: &Path,
    ) -> MediaResult<()> {
        info!(
            url,
            format = format_selector,
            output = %output_template.display(),
            "Downloading video"
        );
        self.run(&Self::download_args(url, format_selector, output_template))
            .await?;
        Ok(())
    }
}
