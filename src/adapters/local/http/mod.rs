//! HTTP inbound adapter.
//!
//! JSON API for submitting clip jobs and polling them, plus the download
//! endpoint that streams finished clips.

pub mod error;
pub mod handlers;

use crate::application::orchestrator::ClipService;
use crate::ports::repository::JobRepository;
use axum::routing::{get, post};
use axum::Router;
use handlers::{clip, download, health, info, status};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub clips: Arc<ClipService>,
    pub store: Arc<dyn JobRepository>,
    pub download_dir: PathBuf,
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/video-info", post(info::video_info))
        .route("/api/clip", post(clip::create_clip))
        .route("/api/status/:job_id", get(status::job_status))
        .route("/api/health", get(health::health))
        .route("/download/:job_id", get(download::download_clip))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
