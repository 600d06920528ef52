//! ytclip - YouTube clip service
//!
//! Hexagonal Architecture:
//! - domain/: Pure business logic (time ranges, qualities, video metadata, jobs)
//! - ports/: Trait definitions (source resolver, clipper, job repository)
//! - adapters/: Concrete implementations (yt-dlp, ffmpeg, in-memory store, HTTP API)
//! - application/: Services (submission, job executor, janitor)
//! - config: Environment configuration

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod ports;

// Re-exports for convenience
pub use adapters::local::http::{router, AppState};
pub use config::LocalConfig;
