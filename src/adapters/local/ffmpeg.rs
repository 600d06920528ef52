//! `Clipper` backed by the ffmpeg command line.

use crate::error::{MediaError, MediaResult};
use crate::ports::clipper::{ClipRequest, Clipper};
use async_trait::async_trait;
use std::io;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct FfmpegClipper {
    bin: PathBuf,
}

impl FfmpegClipper {
    pub fn new(bin: impl Into<PathBuf>) -> Self {
        Self { bin: bin.into() }
    }

    /// H.264/AAC output with the moov atom first.
    pub fn build_args(request: &ClipRequest) -> Vec<String> {
        let mut args: Vec<String> = vec!["-y".into(), "-hide_banner".into()];
        args.extend(["-i".into(), request.input.to_string_lossy().into_owned()]);
        args.extend(["-ss".into(), request.start.to_string()]);
        args.extend(["-t".into(), request.duration.to_string()]);
        args.extend(
            [
                "-c:v",
                "libx264",
                "-c:a",
                "aac",
                "-preset",
                "fast",
                "-crf",
                "23",
                "-movflags",
                "+faststart",
                "-avoid_negative_ts",
                "make_zero",
            ]
            .map(String::from),
        );
        args.push(request.output.to_string_lossy().into_owned());
        args
    }
}

impl Default for FfmpegClipper {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

#[async_trait]
impl Clipper for FfmpegClipper {
    async fn clip(&self, request: &ClipRequest) -> MediaResult<()> {
        let args = Self::build_args(request);
        debug!(args = ?&args[..8], "Running ffmpeg");

        // Dropping the future (timeout) kills the child.
        let output = Command::new(&self.bin)
            .args(&args)
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
            let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
            warn!(status = ?output.status.code(), "ffmpeg failed");
            return Err(MediaError::process_failed(
                "ffmpeg",
                stderr,
                output.status.code(),
            ));
        }
        Ok(())
    }
}
