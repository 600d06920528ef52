//! Monolith Binary - Local deployment of the clip service
//!
//! It wires up:
//! - Local adapters (yt-dlp, ffmpeg, in-memory job store)
//! - Clip submission and job execution services
//! - The janitor that evicts old jobs
//! - HTTP/JSON inbound adapter

use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use ytclip::adapters::local::{FfmpegClipper, InMemoryJobStore, YtDlpResolver};
use ytclip::application::janitor::Janitor;
use ytclip::application::metadata::MetadataService;
use ytclip::application::orchestrator::ClipService;
use ytclip::application::worker::{ExecutorSettings, JobExecutor};
use ytclip::config::LocalConfig;
use ytclip::ports::repository::JobRepository;
use ytclip::{router, AppState};

#[tokio::main]
async fn main() {
    let config = LocalConfig::from_env();

    init_tracing(config.json_logs);

    if let Err(e) = tokio::fs::create_dir_all(&config.download_dir).await {
        eprintln!(
            "Failed to create download directory {}: {}",
            config.download_dir.display(),
            e
        );
        std::process::exit(1);
    }

    // 1. Adapters
    let store: Arc<dyn JobRepository> = Arc::new(InMemoryJobStore::new());
    let resolver = Arc::new(YtDlpResolver::new(&config.ytdlp_bin));
    let clipper = Arc::new(FfmpegClipper::new(&config.ffmpeg_bin));

    // 2. Application Services
    let executor = Arc::new(JobExecutor::new(
        store.clone(),
        resolver.clone(),
        clipper,
        ExecutorSettings {
            download_dir: config.download_dir.clone(),
            clip_timeout: config.clip_timeout,
        },
    ));
    let clips = Arc::new(ClipService::new(
        MetadataService::new(resolver),
        store.clone(),
        executor,
    ));

    // 3. Janitor
    let janitor = Janitor::new(
        store.clone(),
        config.download_dir.clone(),
        config.job_retention,
        config.cleanup_interval,
    );
    tokio::spawn(async move { janitor.run().await });

    // 4. HTTP Layer
    let app = router(AppState {
        clips,
        store,
        download_dir: config.download_dir.clone(),
    });

    // 5. Start Server
    let listener = tokio::net::TcpListener::bind(config.bind_addr())
        .await
        .expect("Failed to bind TCP listener");
    info!(
        addr = %config.bind_addr(),
        download_dir = %config.download_dir.display(),
        "Listening"
    );
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server failed to start");

    info!("Server shutdown complete");
}

fn init_tracing(json: bool) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_target(false))
            .with(env_filter)
            .init();
    }
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install CTRL+C handler");
    info!("Received shutdown signal");
}
