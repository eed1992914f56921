//! End-to-end job runs against mock workers and a byte-level media engine.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use scenecast_media::{MediaEngine, MediaResult};
use scenecast_models::{encode_payload, AssetMap, AssetRef, JobStatus, SceneInput};
use scenecast_pipeline::{
    AudioTrack, ClientError, InMemoryJobStore, Orchestrator, PipelineConfig, PipelineError,
    RenderRequest,
};

const BASE_URL: &str = "http://localhost:3000";

/// Writes marker bytes instead of encoding: renders copy their input,
/// concat joins files, muxing appends the audio.
struct MarkerEngine;

#[async_trait]
impl MediaEngine for MarkerEngine {
    async fn render_looped_video(
        &self,
        input: &Path,
        output: &Path,
        _duration: f64,
    ) -> MediaResult<()> {
        tokio::fs::copy(input, output).await?;
        Ok(())
    }

    async fn render_still_image(
        &self,
        image: &Path,
        output: &Path,
        _duration: f64,
    ) -> MediaResult<()> {
        tokio::fs::copy(image, output).await?;
        Ok(())
    }

    async fn concat(&self, segments: &[PathBuf], output: &Path) -> MediaResult<()> {
        let mut joined = Vec::new();
        for segment in segments {
            joined.extend(tokio::fs::read(segment).await?);
        }
        tokio::fs::write(output, joined).await?;
        Ok(())
    }

    async fn mux_audio(&self, video: &Path, audio: &Path, output: &Path) -> MediaResult<()> {
        let mut bytes = tokio::fs::read(video).await?;
        bytes.extend(tokio::fs::read(audio).await?);
        tokio::fs::write(output, bytes).await?;
        Ok(())
    }
}

struct Harness {
    _root: TempDir,
    scratch_root: PathBuf,
    output_dir: PathBuf,
    store: Arc<InMemoryJobStore>,
    orchestrator: Arc<Orchestrator>,
}

fn harness(workers: Vec<String>) -> Harness {
    let root = TempDir::new().unwrap();
    let scratch_root = root.path().join("scratch");
    let output_dir = root.path().join("public");

    let config = PipelineConfig {
        scratch_root: scratch_root.clone(),
        output_dir: output_dir.clone(),
        ..PipelineConfig::default()
    }
    .with_workers(workers);

    let store = Arc::new(InMemoryJobStore::new());
    let orchestrator = Orchestrator::new(config, store.clone(), Arc::new(MarkerEngine)).unwrap();

    Harness {
        _root: root,
        scratch_root,
        output_dir,
        store,
        orchestrator: Arc::new(orchestrator),
    }
}

fn image(name: &str) -> SceneInput {
    SceneInput {
        paragraph: Some(format!("paragraph for {}", name)),
        video_url: None,
        image_file: Some(name.to_string()),
        duration: 2.0,
    }
}

fn video(url: &str) -> SceneInput {
    SceneInput {
        paragraph: None,
        video_url: Some(url.to_string()),
        image_file: None,
        duration: 3.0,
    }
}

/// Scenes 0 and 2 are images, scene 1 is a remote clip.
fn storyboard(video_url: &str) -> RenderRequest {
    RenderRequest {
        scenes: vec![image("image0"), video(video_url), image("image2")],
        assets: AssetMap::from([
            (AssetRef::from("image0"), b"<img0>".to_vec()),
            (AssetRef::from("image2"), b"<img2>".to_vec()),
        ]),
        audio: Some(AudioTrack::new("narration.mp3", b"<audio>".to_vec())),
    }
}

fn processed(indices: &[usize]) -> serde_json::Value {
    json!({
        "processedScenes": indices
            .iter()
            .map(|i| {
                let data = encode_payload(format!("<seg{}>", i).as_bytes());
                json!({ "orderIndex": i, "videoData": data })
            })
            .collect::<Vec<_>>()
    })
}

fn worker_endpoint(server: &MockServer) -> String {
    format!("{}/process-scenes", server.uri())
}

fn scratch_entries(root: &Path) -> usize {
    match std::fs::read_dir(root) {
        Ok(entries) => entries.count(),
        Err(_) => 0,
    }
}

#[tokio::test]
async fn test_two_workers_complete_in_order() {
    let first = MockServer::start().await;
    let second = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/process-scenes"))
        .and(body_partial_json(json!({
            "assets": { "image0": encode_payload(b"<img0>"), "image2": encode_payload(b"<img2>") }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(processed(&[0, 2])))
        .expect(1)
        .mount(&first)
        .await;
    Mock::given(method("POST"))
        .and(path("/process-scenes"))
        .and(body_partial_json(json!({ "scenes": [{ "orderIndex": 1 }] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(processed(&[1])))
        .expect(1)
        .mount(&second)
        .await;

    let h = harness(vec![worker_endpoint(&first), worker_endpoint(&second)]);
    let handle = h
        .orchestrator
        .submit(storyboard("https://cdn.example/clip.mp4"), BASE_URL)
        .await
        .unwrap();
    let job_id = handle.job_id().clone();
    let job = handle.wait().await.unwrap();

    assert_eq!(job.status, JobStatus::Completed, "error: {:?}", job.error_detail);
    let expected_url = format!("{}/job_{}.mp4", BASE_URL, job_id);
    assert_eq!(job.result_url.as_deref(), Some(expected_url.as_str()));
    assert!(job.error_detail.is_none());

    let published = std::fs::read(h.output_dir.join(format!("job_{}.mp4", job_id))).unwrap();
    assert_eq!(published, b"<seg0><seg1><seg2><audio>");
    assert_eq!(scratch_entries(&h.scratch_root), 0);
}

#[tokio::test]
async fn test_failing_worker_fails_the_job() {
    let healthy = MockServer::start().await;
    let broken = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(processed(&[0, 2])))
        .mount(&healthy)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("encoder exploded"))
        .mount(&broken)
        .await;

    let broken_endpoint = worker_endpoint(&broken);
    let h = harness(vec![worker_endpoint(&healthy), broken_endpoint.clone()]);
    let handle = h
        .orchestrator
        .submit(storyboard("https://cdn.example/clip.mp4"), BASE_URL)
        .await
        .unwrap();
    let job_id = handle.job_id().clone();
    let job = handle.wait().await.unwrap();

    assert_eq!(job.status, JobStatus::Failed);
    assert!(job.result_url.is_none());
    let detail = job.error_detail.unwrap();
    assert!(detail.contains(&broken_endpoint), "detail: {}", detail);

    assert_eq!(scratch_entries(&h.scratch_root), 0);
    assert!(!h.output_dir.join(format!("job_{}.mp4", job_id)).exists());
}

#[tokio::test]
async fn test_gap_in_worker_results_fails_the_job() {
    let lazy = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(processed(&[0])))
        .mount(&lazy)
        .await;

    let h = harness(vec![worker_endpoint(&lazy)]);
    let job = h
        .orchestrator
        .submit(storyboard("https://cdn.example/clip.mp4"), BASE_URL)
        .await
        .unwrap()
        .wait()
        .await
        .unwrap();

    assert_eq!(job.status, JobStatus::Failed);
    assert!(job.error_detail.unwrap().contains("[1, 2]"));
}

#[tokio::test]
async fn test_running_job_reports_processing() {
    let slow = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(processed(&[0, 1, 2]))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&slow)
        .await;

    let h = harness(vec![worker_endpoint(&slow)]);
    let handle = h
        .orchestrator
        .submit(storyboard("https://cdn.example/clip.mp4"), BASE_URL)
        .await
        .unwrap();
    let job_id = handle.job_id().clone();

    let running = h.orchestrator.status(&job_id).await.unwrap();
    assert_eq!(running.status, JobStatus::Processing);
    assert!(running.result_url.is_none());
    assert!(running.error_detail.is_none());

    let job = handle.wait().await.unwrap();
    assert_eq!(job.status, JobStatus::Completed, "error: {:?}", job.error_detail);
    assert_eq!(
        h.orchestrator.status(&job_id).await.unwrap().status,
        JobStatus::Completed
    );
}

#[tokio::test]
async fn test_terminal_status_is_stable() {
    let worker = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(processed(&[0, 1, 2])))
        .mount(&worker)
        .await;

    let h = harness(vec![worker_endpoint(&worker)]);
    let handle = h
        .orchestrator
        .submit(storyboard("https://cdn.example/clip.mp4"), BASE_URL)
        .await
        .unwrap();
    let job_id = handle.job_id().clone();
    handle.wait().await.unwrap();

    let first = h.orchestrator.status(&job_id).await.unwrap();
    let second = h.orchestrator.status(&job_id).await.unwrap();
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[tokio::test]
async fn test_submit_without_audio_creates_nothing() {
    let h = harness(vec!["http://worker-0:4000/process-scenes".to_string()]);
    let mut request = storyboard("https://cdn.example/clip.mp4");
    request.audio = None;

    let err = h.orchestrator.submit(request, BASE_URL).await.unwrap_err();
    assert!(matches!(err, PipelineError::Client(ClientError::MissingAudio)));
    assert!(h.store.is_empty().await);
    assert!(!h.scratch_root.exists());
}

#[tokio::test]
async fn test_submit_with_invalid_scene_creates_nothing() {
    let h = harness(vec!["http://worker-0:4000/process-scenes".to_string()]);
    let mut request = storyboard("https://cdn.example/clip.mp4");
    request.scenes[1].duration = -1.0;

    let err = h.orchestrator.submit(request, BASE_URL).await.unwrap_err();
    assert!(err.is_client_error());
    assert!(h.store.is_empty().await);
}

#[tokio::test]
async fn test_sync_without_audio_fails_immediately() {
    let h = harness(Vec::new());
    let mut request = storyboard("https://cdn.example/clip.mp4");
    request.audio = None;

    let err = h.orchestrator.render_sync(request, BASE_URL).await.unwrap_err();
    assert!(matches!(err, PipelineError::Client(ClientError::MissingAudio)));
    assert!(h.store.is_empty().await);
    assert!(!h.scratch_root.exists());
}

#[tokio::test]
async fn test_sync_renders_locally() {
    let cdn = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/clip.mp4"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"<clip>".to_vec()))
        .expect(1)
        .mount(&cdn)
        .await;

    let h = harness(Vec::new());
    let url = h
        .orchestrator
        .render_sync(storyboard(&format!("{}/clip.mp4", cdn.uri())), BASE_URL)
        .await
        .unwrap();

    let file_name = url.strip_prefix(&format!("{}/", BASE_URL)).unwrap();
    assert!(file_name.starts_with("merged_"));
    assert!(file_name.ends_with(".mp4"));

    let published = std::fs::read(h.output_dir.join(file_name)).unwrap();
    assert_eq!(published, b"<img0><clip><img2><audio>");
    assert!(h.store.is_empty().await);
    assert_eq!(scratch_entries(&h.scratch_root), 0);
}
