//! Resolution buckets offered to the user and the matching download selectors.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A fixed resolution tier. Variants are declared highest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Quality {
    Uhd2160,
    Qhd1440,
    Fhd1080,
    Hd720,
    Sd480,
    Sd360,
}

impl Quality {
    /// All buckets, highest resolution first.
    pub const ALL: [Quality; 6] = [
        Quality::Uhd2160,
        Quality::Qhd1440,
        Quality::Fhd1080,
        Quality::Hd720,
        Quality::Sd480,
        Quality::Sd360,
    ];

    /// Minimum frame height for the bucket.
    pub fn height(self) -> u32 {
        match self {
            Quality::Uhd2160 => 2160,
            Quality::Qhd1440 => 1440,
            Quality::Fhd1080 => 1080,
            Quality::Hd720 => 720,
            Quality::Sd480 => 480,
            Quality::Sd360 => 360,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Quality::Uhd2160 => "4K (2160p)",
            Quality::Qhd1440 => "1440p",
            Quality::Fhd1080 => "1080p",
            Quality::Hd720 => "720p",
            Quality::Sd480 => "480p",
            Quality::Sd360 => "360p",
        }
    }

    /// Highest bucket a stream of `height` pixels qualifies for.
    pub fn for_height(height: u32) -> Option<Quality> {
        Quality::ALL.into_iter().find(|q| height >= q.height())
    }

    /// yt-dlp format expression: exact-height video plus best audio, else best.
    pub fn format_selector(self) -> String {
        format!("bestvideo[height={}]+bestaudio/best", self.height())
    }

    /// Label form safe for filenames, e.g. `4K_2160p`.
    pub fn file_tag(self) -> String {
        self.label().replace(' ', "_").replace(['(', ')'], "")
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownQuality(pub String);

impl fmt::Display for UnknownQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown quality {}", self.0)
    }
}

impl std::error::Error for UnknownQuality {}

impl FromStr for Quality {
    type Err = UnknownQuality;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Quality::ALL
            .into_iter()
            .find(|q| q.label() == s || format!("{}p", q.height()) == s)
            .ok_or_else(|| UnknownQuality(s.to_string()))
    }
}

impl TryFrom<String> for Quality {
    type Error = UnknownQuality;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Quality> for String {
    fn from(value: Quality) -> Self {
        value.label().to_string()
    }
}
