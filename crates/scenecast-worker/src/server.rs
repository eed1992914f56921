//! Worker HTTP surface.
//!
//! `POST /process-scenes` renders one partition and returns every segment
//! inline, base64-encoded.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use scenecast_media::{FfmpegEngine, MediaEngine, SceneRenderer, ScratchSpace};
use scenecast_models::{
    encode_payload, AssetMap, ProcessedScene, Scene, WorkerRequest, WorkerResponse,
};

use crate::config::WorkerServerConfig;
use crate::error::{WorkerServerError, WorkerServerResult};

/// Shared worker state.
#[derive(Clone)]
pub struct WorkerState {
    pub config: WorkerServerConfig,
    pub renderer: SceneRenderer,
}

impl WorkerState {
    pub fn new(
        config: WorkerServerConfig,
        engine: Arc<dyn MediaEngine>,
    ) -> WorkerServerResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.download_timeout)
            .build()
            .map_err(|e| WorkerServerError::Io(std::io::Error::other(e)))?;

        Ok(Self {
            renderer: SceneRenderer::new(engine, http),
            config,
        })
    }

    /// State backed by the FFmpeg engine.
    pub fn from_config(config: WorkerServerConfig) -> WorkerServerResult<Self> {
        let engine = FfmpegEngine::with_timeout(config.encoder_timeout.as_secs());
        Self::new(config, Arc::new(engine))
    }
}

/// Create the worker router.
pub fn create_router(state: WorkerState) -> Router {
    let max_body_size = state.config.max_body_size;

    Router::new()
        .route("/process-scenes", post(process_scenes))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(max_body_size))
        .layer(RequestBodyLimitLayer::new(max_body_size))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: String,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now().to_rfc3339(),
    })
}

/// Render the scenes of one partition.
pub async fn process_scenes(
    State(state): State<WorkerState>,
    payload: Result<Json<WorkerRequest>, JsonRejection>,
) -> WorkerServerResult<Json<WorkerResponse>> {
    let Json(request) = payload.map_err(|e| WorkerServerError::bad_request(e.body_text()))?;
    let assets = request.decode_assets().map_err(|(reference, e)| {
        WorkerServerError::bad_request(format!("asset {} is not valid base64: {}", reference, e))
    })?;

    let started = Instant::now();
    info!(
        scenes = request.scenes.len(),
        assets = assets.len(),
        "Partition received"
    );

    let scratch = ScratchSpace::create(&state.config.scratch_root, "partition").await?;
    let result = render_partition(&state.renderer, &request.scenes, &assets, &scratch).await;
    if let Err(e) = scratch.cleanup().await {
        warn!("Scratch cleanup failed: {}", e);
    }

    let response = result?;
    info!(
        segments = response.processed_scenes.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Partition rendered"
    );
    Ok(Json(response))
}

async fn render_partition(
    renderer: &SceneRenderer,
    scenes: &[Scene],
    assets: &AssetMap,
    scratch: &ScratchSpace,
) -> WorkerServerResult<WorkerResponse> {
    let segments = renderer.render_all(scenes, assets, scratch.path()).await?;

    let mut processed_scenes = Vec::with_capacity(segments.len());
    for segment in segments {
        let bytes = tokio::fs::read(&segment.local_path).await?;
        processed_scenes.push(ProcessedScene {
            order_index: segment.order_index,
            video_data: encode_payload(&bytes),
        });
    }

    Ok(WorkerResponse { processed_scenes })
}
