//! Synchronous merge endpoint.

use axum::extract::{Multipart, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::Serialize;
use tracing::info;

use crate::error::ApiResult;
use crate::handlers::upload::{base_url, read_render_request};
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeResponse {
    pub video_url: String,
}

/// Render a storyboard within the request and return the video URL.
pub async fn merge_videos(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Multipart,
) -> ApiResult<Json<MergeResponse>> {
    let request = read_render_request(multipart).await?;
    info!(
        scenes = request.scenes.len(),
        assets = request.assets.len(),
        "Merge request received"
    );

    let video_url = state
        .orchestrator
        .render_sync(request, &base_url(&headers))
        .await?;

    Ok(Json(MergeResponse { video_url }))
}
