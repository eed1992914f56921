//! Worker contract tests through the router.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use scenecast_media::{MediaEngine, MediaError, MediaResult};
use scenecast_models::{decode_payload, encode_payload};
use scenecast_worker::{create_router, WorkerServerConfig, WorkerState};

/// Stills are "rendered" by prefixing the image bytes.
struct StillOnlyEngine;

#[async_trait]
impl MediaEngine for StillOnlyEngine {
    async fn render_looped_video(
        &self,
        _input: &Path,
        _output: &Path,
        _duration: f64,
    ) -> MediaResult<()> {
        Err(MediaError::internal("no video rendering in tests"))
    }

    async fn render_still_image(
        &self,
        image: &Path,
        output: &Path,
        duration: f64,
    ) -> MediaResult<()> {
        let mut bytes = format!("still[{}]:", duration).into_bytes();
        bytes.extend(tokio::fs::read(image).await?);
        tokio::fs::write(output, bytes).await?;
        Ok(())
    }

    async fn concat(&self, _segments: &[PathBuf], _output: &Path) -> MediaResult<()> {
        Err(MediaError::internal("workers never concatenate"))
    }

    async fn mux_audio(&self, _video: &Path, _audio: &Path, _output: &Path) -> MediaResult<()> {
        Err(MediaError::internal("workers never mux"))
    }
}

fn router(scratch: &TempDir) -> Router {
    let config = WorkerServerConfig {
        scratch_root: scratch.path().to_path_buf(),
        ..WorkerServerConfig::default()
    };
    create_router(WorkerState::new(config, Arc::new(StillOnlyEngine)).unwrap())
}

fn post_json(body: String) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/process-scenes")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn image_scene(order_index: usize, asset: &str) -> Value {
    json!({
        "orderIndex": order_index,
        "source": { "kind": "still_image", "asset": asset },
        "duration": 2.0
    })
}

#[tokio::test]
async fn test_health() {
    let scratch = TempDir::new().unwrap();
    let response = router(&scratch)
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_renders_partition_and_returns_segments() {
    let scratch = TempDir::new().unwrap();
    let body = json!({
        "scenes": [image_scene(1, "image1"), image_scene(3, "image3")],
        "assets": {
            "image1": encode_payload(b"one"),
            "image3": encode_payload(b"three")
        }
    });

    let response = router(&scratch).oneshot(post_json(body.to_string())).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let processed = body_json(response).await["processedScenes"].clone();
    let processed = processed.as_array().unwrap();
    assert_eq!(processed.len(), 2);
    assert_eq!(processed[0]["orderIndex"], 1);
    assert_eq!(processed[1]["orderIndex"], 3);
    assert_eq!(
        decode_payload(processed[1]["videoData"].as_str().unwrap()).unwrap(),
        b"still[2]:three"
    );

    // per-request scratch space is gone
    assert_eq!(std::fs::read_dir(scratch.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_scene_without_asset_is_skipped() {
    let scratch = TempDir::new().unwrap();
    let body = json!({
        "scenes": [image_scene(0, "image0"), image_scene(2, "image2")],
        "assets": { "image0": encode_payload(b"zero") }
    });

    let response = router(&scratch).oneshot(post_json(body.to_string())).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let processed = body_json(response).await["processedScenes"].clone();
    assert_eq!(processed.as_array().unwrap().len(), 1);
    assert_eq!(processed[0]["orderIndex"], 0);
}

#[tokio::test]
async fn test_undecodable_asset_is_a_bad_request() {
    let scratch = TempDir::new().unwrap();
    let body = json!({
        "scenes": [image_scene(0, "image0")],
        "assets": { "image0": "%%% not base64 %%%" }
    });

    let response = router(&scratch).oneshot(post_json(body.to_string())).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(response).await["detail"]
        .as_str()
        .unwrap()
        .contains("image0"));
}

#[tokio::test]
async fn test_malformed_json_is_a_bad_request() {
    let scratch = TempDir::new().unwrap();
    let response = router(&scratch)
        .oneshot(post_json("{\"scenes\": [".to_string()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unreachable_source_is_an_internal_error() {
    let scratch = TempDir::new().unwrap();
    let body = json!({
        "scenes": [{
            "orderIndex": 0,
            "source": { "kind": "remote_video", "url": "http://127.0.0.1:9/unreachable.mp4" },
            "duration": 1.0
        }],
        "assets": {}
    });

    let response = router(&scratch).oneshot(post_json(body.to_string())).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let detail = body_json(response).await["detail"].as_str().unwrap().to_string();
    assert!(detail.starts_with("Rendering failed"), "detail: {}", detail);
    assert_eq!(std::fs::read_dir(scratch.path()).unwrap().count(), 0);
}
