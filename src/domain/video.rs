//! Video metadata as reported by the source resolver and as exposed to clients.

use super::quality::Quality;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::OnceLock;

/// Hosts accepted by the API.
const SUPPORTED_DOMAINS: [&str; 2] = ["youtube.com", "youtu.be"];

const DESCRIPTION_PREVIEW_CHARS: usize = 200;

/// One downloadable format listed by the resolver.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawFormat {
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub vcodec: Option<String>,
}

impl RawFormat {
    /// `vcodec == "none"` marks an audio-only format.
    pub fn has_video(&self) -> bool {
        self.vcodec.as_deref() != Some("none")
    }
}

/// Metadata-only answer from the resolver, before bucketing.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawVideoInfo {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub uploader: Option<String>,
    #[serde(default)]
    pub view_count: Option<u64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub formats: Vec<RawFormat>,
}

/// Resolved, immutable description of a video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoMetadata {
    pub video_id: Option<String>,
    pub title: String,
    pub duration: u64,
    pub thumbnail: String,
    pub uploader: String,
    pub view_count: u64,
    pub description: String,
    pub qualities: Vec<Quality>,
}

impl VideoMetadata {
    pub fn from_raw(video_id: Option<String>, raw: RawVideoInfo) -> Self {
        let qualities = available_qualities(&raw.formats);
        Self {
            video_id,
            title: raw.title.unwrap_or_else(|| "Unknown Video".to_string()),
            duration: raw
                .duration
                .filter(|d| d.is_finite() && *d > 0.0)
                .map(|d| d.ceil() as u64)
                .unwrap_or(0),
            thumbnail: raw.thumbnail.unwrap_or_default(),
            uploader: raw.uploader.unwrap_or_else(|| "Unknown".to_string()),
            view_count: raw.view_count.unwrap_or(0),
            description: raw
                .description
                .as_deref()
                .map(preview_description)
                .unwrap_or_default(),
            qualities,
        }
    }

    pub fn offers(&self, quality: Quality) -> bool {
        self.qualities.contains(&quality)
    }
}

/// Distinct buckets for the video formats, highest first.
pub fn available_qualities(formats: &[RawFormat]) -> Vec<Quality> {
    formats
        .iter()
        .filter(|f| f.has_video())
        .filter_map(|f| f.height)
        .filter_map(Quality::for_height)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn preview_description(description: &str) -> String {
    if description.is_empty() {
        return String::new();
    }
    let mut preview: String = description.chars().take(DESCRIPTION_PREVIEW_CHARS).collect();
    preview.push_str("...");
    preview
}

/// Whether the URL points at a supported video host.
pub fn is_supported_url(url: &str) -> bool {
    let url = url.to_lowercase();
    SUPPORTED_DOMAINS.iter().any(|domain| url.contains(domain))
}

fn video_id_patterns() -> &'static [Regex; 2] {
    static PATTERNS: OnceLock<[Regex; 2]> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            Regex::new(r"(?:youtube\.com/watch\?v=|youtu\.be/|youtube\.com/embed/)([^&\n?#]+)")
                .expect("static regex"),
            Regex::new(r"youtube\.com/watch\?.*v=([^&\n?#]+)").expect("static regex"),
        ]
    })
}

/// Extract the video identifier from watch, short and embed URLs.
pub fn extract_video_id(url: &str) -> Option<String> {
    video_id_patterns()
        .iter()
        .find_map(|re| re.captures(url))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}
