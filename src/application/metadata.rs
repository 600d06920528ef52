use crate::domain::video::{extract_video_id, VideoMetadata};
use crate::error::ResolveError;
use crate::ports::resolver::SourceResolver;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

/// Resolves video metadata, caching it forever by video identifier.
pub struct MetadataService {
    resolver: Arc<dyn SourceResolver>,
    cache: Mutex<HashMap<String, VideoMetadata>>,
}

impl MetadataService {
    pub fn new(resolver: Arc<dyn SourceResolver>) -> Self {
        Self {
            resolver,
            cache: Mutex::new(HashMap::new()),
        }
    }

    fn cached(&self, video_id: &str) -> Option<VideoMetadata> {
        self.cache
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(video_id)
            .cloned()
    }

    pub async fn resolve(&self, url: &str) -> Result<VideoMetadata, ResolveError> {
        let video_id = extract_video_id(url);

        if let Some(hit) = video_id.as_deref().and_then(|id| self.cached(id)) {
            info!(video_id = ?video_id, "Using cached video info");
            return Ok(hit);
        }

        let raw = self.resolver.fetch_info(url).await.map_err(|e| {
            warn!(url, error = %e, "Error getting video info");
            ResolveError::ResolutionFailed(e.cause())
        })?;

        let metadata = VideoMetadata::from_raw(video_id.clone(), raw);

        if let Some(id) = video_id {
            self.cache
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .insert(id, metadata.clone());
        }

        info!(
            title = %metadata.title,
            duration = metadata.duration,
            qualities = metadata.qualities.len(),
            "Video info resolved"
        );
        Ok(metadata)
    }

    pub fn cache_len(&self) -> usize {
        self.cache.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}
