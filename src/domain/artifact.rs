//! Deterministic, job-namespaced file naming inside the downloads directory.

use super::jobs::JobId;
use super::quality::Quality;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Smallest output we accept as a real clip.
pub const MIN_CLIP_BYTES: u64 = 1024;

const MAX_TITLE_CHARS: usize = 50;

/// Reduce a video title to something safe to embed in a filename.
pub fn clean_filename(title: &str) -> String {
    static RES: OnceLock<[Regex; 3]> = OnceLock::new();
    let [forbidden, non_word, separators] = RES.get_or_init(|| {
        [
            Regex::new(r#"[<>:"/\\|?*]"#).expect("static regex"),
            Regex::new(r"[^\w\s-]").expect("static regex"),
            Regex::new(r"[-\s]+").expect("static regex"),
        ]
    });

    let cleaned = forbidden.replace_all(title, "");
    let cleaned = non_word.replace_all(&cleaned, "");
    let cleaned = separators.replace_all(&cleaned, "-");
    cleaned
        .trim_matches('-')
        .chars()
        .take(MAX_TITLE_CHARS)
        .collect()
}

/// Filenames owned by one job.
#[derive(Debug, Clone)]
pub struct ArtifactNames<'a> {
    job_id: &'a JobId,
}

impl<'a> ArtifactNames<'a> {
    pub fn new(job_id: &'a JobId) -> Self {
        Self { job_id }
    }

    /// Prefix of the temporary download; the resolver picks the extension.
    pub fn temp_prefix(&self) -> String {
        format!("temp_{}", self.job_id)
    }

    /// Output template handed to the resolver.
    pub fn temp_template(&self, dir: &Path) -> PathBuf {
        dir.join(format!("{}.%(ext)s", self.temp_prefix()))
    }

    pub fn clip_prefix(&self) -> String {
        format!("clip_{}", self.job_id)
    }

    pub fn clip_filename(&self, title: &str, quality: Quality) -> String {
        format!(
            "{}_{}_{}.mp4",
            self.clip_prefix(),
            clean_filename(title),
            quality.file_tag()
        )
    }

    /// True for any file name carrying this job's identifier.
    pub fn owns(&self, file_name: &str) -> bool {
        file_name.contains(self.job_id.as_str())
    }
}
