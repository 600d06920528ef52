//! Domain layer - Pure business logic.

pub mod artifact;
pub mod jobs;
pub mod quality;
pub mod timecode;
pub mod video;
