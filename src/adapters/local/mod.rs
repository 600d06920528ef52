//! Local adapters for monolith deployment.

pub mod ffmpeg;
pub mod http;
pub mod memory;
pub mod ytdlp;

pub use ffmpeg::FfmpegClipper;
pub use memory::InMemoryJobStore;
pub use ytdlp::YtDlpResolver;
