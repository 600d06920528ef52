//! Configuration for the monolith deployment.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Configuration for local/monolith deployment.
#[derive(Clone, Debug)]
pub struct LocalConfig {
    /// HTTP server bind address
    pub addr: String,
    /// HTTP server port
    pub port: String,
    /// Directory for temporary downloads and finished clips
    pub download_dir: PathBuf,
    /// yt-dlp executable
    pub ytdlp_bin: String,
    /// ffmpeg executable
    pub ffmpeg_bin: String,
    /// Wall-clock limit for one clip step
    pub clip_timeout: Duration,
    /// Age after which the janitor evicts a job
    pub job_retention: Duration,
    /// Time between janitor sweeps
    pub cleanup_interval: Duration,
    /// Emit logs as JSON lines
    pub json_logs: bool,
}

impl LocalConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let text = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());
        let secs = |key: &str, default: u64| {
            Duration::from_secs(parse_or(lookup(key).as_deref(), default))
        };
        // A zero period cannot drive a ticker.
        let period = |key: &str, default: u64| {
            Some(secs(key, default))
                .filter(|d| !d.is_zero())
                .unwrap_or(Duration::from_secs(default))
        };

        Self {
            addr: text("ADDR", "127.0.0.1"),
            port: text("PORT", "5000"),
            download_dir: PathBuf::from(text("DOWNLOAD_DIR", "downloads")),
            ytdlp_bin: text("YTDLP_BIN", "yt-dlp"),
            ffmpeg_bin: text("FFMPEG_BIN", "ffmpeg"),
            clip_timeout: secs("CLIP_TIMEOUT_SECS", 300),
            job_retention: secs("JOB_RETENTION_SECS", 3600),
            cleanup_interval: period("CLEANUP_INTERVAL_SECS", 1800),
            json_logs: lookup("LOG_FORMAT").is_some_and(|v| v.eq_ignore_ascii_case("json")),
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.addr, self.port)
    }
}

fn parse_or<T: FromStr>(raw: Option<&str>, default: T) -> T {
    raw.and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> LocalConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        LocalConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]);
        assert_eq!(config.bind_addr(), "127.0.0.1:5000");
        assert_eq!(config.download_dir, PathBuf::from("downloads"));
        assert_eq!(config.ytdlp_bin, "yt-dlp");
        assert_eq!(config.clip_timeout, Duration::from_secs(300));
        assert_eq!(config.job_retention, Duration::from_secs(3600));
        assert_eq!(config.cleanup_interval, Duration::from_secs(1800));
        assert!(!config.json_logs);
    }

    #[test]
    fn test_overrides_and_bad_numbers() {
        let config = config(&[
            ("PORT", "8080"),
            ("CLIP_TIMEOUT_SECS", "60"),
            ("JOB_RETENTION_SECS", "soon"),
            ("LOG_FORMAT", "JSON"),
        ]);
        assert_eq!(config.port, "8080");
        assert_eq!(config.clip_timeout, Duration::from_secs(60));
        assert_eq!(config.job_retention, Duration::from_secs(3600));
        assert!(config.json_logs);
    }

    #[test]
    fn test_zero_cleanup_interval_falls_back() {
        let config = config(&[("CLEANUP_INTERVAL_SECS", "0"), ("JOB_RETENTION_SECS", "0")]);
        assert_eq!(config.cleanup_interval, Duration::from_secs(1800));
        assert_eq!(config.job_retention, Duration::ZERO);
    }
}
