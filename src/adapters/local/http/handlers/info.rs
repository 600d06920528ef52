use super::super::error::ApiResult;
use super::super::AppState;
use super::{json_object, text_field};
use crate::domain::video::VideoMetadata;
use axum::body::Bytes;
use axum::extract::State;
use axum::Json;

pub async fn video_info(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<Json<VideoMetadata>> {
    let body = json_object(&body)?;
    let url = text_field(&body, "url");
    let metadata = state.clips.video_info(&url).await?;
    Ok(Json(metadata))
}
