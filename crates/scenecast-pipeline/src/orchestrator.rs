//! Job orchestration.
//!
//! A submitted job runs as one coordinating task:
//! partition, dispatch, reassemble, concatenate, mux audio, publish. Any
//! failure ends the job as `failed`; nothing is retried. The job's scratch
//! space is reclaimed on every path.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use tokio::task::JoinHandle;
use tracing::{error, Instrument};
use uuid::Uuid;

use scenecast_dispatch::{DispatchConfig, WorkerClient};
use scenecast_media::{FfmpegEngine, MediaEngine, SceneRenderer, ScratchSpace};
use scenecast_models::{AssetMap, Job, JobId, JobOutcome, Scene, SceneInput};

use crate::assemble::assemble;
use crate::config::PipelineConfig;
use crate::error::{ClientError, PartitionError, PipelineError, PipelineResult};
use crate::logging::JobLogger;
use crate::metrics::{self, mode};
use crate::partition::{index_scenes, partition};
use crate::reassemble::reassemble;
use crate::registry::{InMemoryJobStore, JobStore};

/// Uploaded audio track.
#[derive(Debug, Clone)]
pub struct AudioTrack {
    pub file_name: String,
    pub data: Vec<u8>,
}

impl AudioTrack {
    pub fn new(file_name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            data,
        }
    }

    /// Write the track into `scratch`, keeping the uploaded extension.
    async fn write_to(&self, scratch: &ScratchSpace) -> PipelineResult<PathBuf> {
        let name = match Path::new(&self.file_name).extension() {
            Some(ext) => format!("audio.{}", ext.to_string_lossy()),
            None => "audio".to_string(),
        };
        let path = scratch.join(name);
        tokio::fs::write(&path, &self.data).await?;
        Ok(path)
    }
}

/// A storyboard submission as received from a client.
#[derive(Debug, Clone, Default)]
pub struct RenderRequest {
    pub scenes: Vec<SceneInput>,
    /// Uploaded images keyed by the name scenes refer to them by.
    pub assets: AssetMap,
    pub audio: Option<AudioTrack>,
}

/// A submission that passed validation.
struct PreparedRender {
    scenes: Vec<Scene>,
    assets: AssetMap,
    audio: AudioTrack,
}

impl PreparedRender {
    fn from_request(request: RenderRequest) -> PipelineResult<Self> {
        let audio = request.audio.ok_or(ClientError::MissingAudio)?;
        let scenes = index_scenes(request.scenes)?;
        Ok(Self {
            scenes,
            assets: request.assets,
            audio,
        })
    }
}

/// Handle to a running job.
#[derive(Debug)]
pub struct JobHandle {
    job_id: JobId,
    handle: JoinHandle<Job>,
}

impl JobHandle {
    pub fn job_id(&self) -> &JobId {
        &self.job_id
    }

    /// Wait for the job to reach its terminal state.
    pub async fn wait(self) -> PipelineResult<Job> {
        self.handle
            .await
            .map_err(|e| PipelineError::internal(format!("job task aborted: {}", e)))
    }
}

/// `{base_url}/{file_name}`
pub fn result_url(base_url: &str, file_name: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), file_name)
}

/// Drives storyboards from submission to a published video.
pub struct Orchestrator {
    config: PipelineConfig,
    store: Arc<dyn JobStore>,
    client: WorkerClient,
    engine: Arc<dyn MediaEngine>,
    renderer: SceneRenderer,
}

impl Orchestrator {
    pub fn new(
        config: PipelineConfig,
        store: Arc<dyn JobStore>,
        engine: Arc<dyn MediaEngine>,
    ) -> PipelineResult<Self> {
        let client = WorkerClient::new(DispatchConfig {
            request_timeout: config.worker_timeout,
            ..DispatchConfig::default()
        })?;

        let http = reqwest::Client::builder()
            .timeout(config.worker_timeout)
            .build()
            .map_err(|e| PipelineError::config(format!("failed to build HTTP client: {}", e)))?;
        let renderer = SceneRenderer::new(Arc::clone(&engine), http);

        Ok(Self {
            config,
            store,
            client,
            engine,
            renderer,
        })
    }

    /// Orchestrator with an in-memory registry and the FFmpeg engine.
    pub fn from_config(config: PipelineConfig) -> PipelineResult<Self> {
        let engine = FfmpegEngine::with_timeout(config.encoder_timeout.as_secs());
        Self::new(config, Arc::new(InMemoryJobStore::new()), Arc::new(engine))
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Validate a submission, register a job and start it in the background.
    ///
    /// Invalid submissions fail here and no job is created.
    pub async fn submit(
        self: &Arc<Self>,
        request: RenderRequest,
        base_url: &str,
    ) -> PipelineResult<JobHandle> {
        let prepared = PreparedRender::from_request(request)?;
        if self.config.worker_endpoints.is_empty() {
            return Err(PartitionError::NoWorkers.into());
        }

        let job = self.store.create().await;
        metrics::record_job_submitted(mode::DISTRIBUTED);

        let this = Arc::clone(self);
        let job_id = job.id.clone();
        let base_url = base_url.to_string();
        let handle = tokio::spawn(async move { this.run_job(job.id, prepared, base_url).await });

        Ok(JobHandle { job_id, handle })
    }

    /// Current snapshot of a job.
    pub async fn status(&self, id: &JobId) -> Option<Job> {
        self.store.get(id).await
    }

    /// Render a storyboard in this process and return the result URL.
    ///
    /// No job record is created.
    pub async fn render_sync(
        &self,
        request: RenderRequest,
        base_url: &str,
    ) -> PipelineResult<String> {
        let prepared = PreparedRender::from_request(request)?;

        let request_id = Uuid::new_v4().to_string();
        let logger = JobLogger::from_string(&request_id, "sync_render");
        metrics::record_job_submitted(mode::SYNC);

        let started = Instant::now();
        logger.log_start(&format!("{} scenes", prepared.scenes.len()));
        let result = self
            .run_sync(&request_id, &prepared, &logger)
            .instrument(logger.span())
            .await;

        match result {
            Ok(file_name) => {
                let url = result_url(base_url, &file_name);
                logger.log_completion(&url);
                metrics::record_job_completed(mode::SYNC, started.elapsed().as_secs_f64());
                Ok(url)
            }
            Err(e) => {
                logger.log_error(&e.to_string());
                metrics::record_job_failed(mode::SYNC, e.stage());
                Err(e)
            }
        }
    }

    async fn run_job(&self, id: JobId, prepared: PreparedRender, base_url: String) -> Job {
        let logger = JobLogger::new(&id, "distributed_render");
        let span = logger.span();

        async {
            let started = Instant::now();
            logger.log_start(&format!(
                "{} scenes across {} workers",
                prepared.scenes.len(),
                self.config.worker_endpoints.len()
            ));

            let outcome = match self.run_distributed(&id, &prepared, &logger).await {
                Ok(file_name) => {
                    let result_url = result_url(&base_url, &file_name);
                    logger.log_completion(&result_url);
                    metrics::record_job_completed(
                        mode::DISTRIBUTED,
                        started.elapsed().as_secs_f64(),
                    );
                    JobOutcome::Completed { result_url }
                }
                Err(e) => {
                    logger.log_error(&e.to_string());
                    metrics::record_job_failed(mode::DISTRIBUTED, e.stage());
                    JobOutcome::Failed { error: e.to_string() }
                }
            };

            self.record_outcome(&id, outcome).await
        }
        .instrument(span)
        .await
    }

    async fn record_outcome(&self, id: &JobId, outcome: JobOutcome) -> Job {
        match self.store.transition(id, outcome.clone()).await {
            Ok(job) => job,
            Err(e) => {
                error!(job_id = %id, error = %e, "Failed to record job outcome");
                match self.store.get(id).await {
                    Some(job) => job,
                    None => {
                        let mut job = Job::new(id.clone());
                        job.finish(outcome);
                        job
                    }
                }
            }
        }
    }

    async fn run_distributed(
        &self,
        id: &JobId,
        prepared: &PreparedRender,
        logger: &JobLogger,
    ) -> PipelineResult<String> {
        let label = format!("job-{}", id);
        let scratch = ScratchSpace::create(&self.config.scratch_root, &label).await?;
        let result = self.distributed_stages(id, prepared, &scratch, logger).await;
        if let Err(e) = scratch.cleanup().await {
            logger.log_warning(&format!("scratch cleanup failed: {}", e));
        }
        result
    }

    async fn distributed_stages(
        &self,
        id: &JobId,
        prepared: &PreparedRender,
        scratch: &ScratchSpace,
        logger: &JobLogger,
    ) -> PipelineResult<String> {
        let tasks = partition(&prepared.scenes, &self.config.worker_endpoints, &prepared.assets)?;
        logger.log_progress(&format!(
            "dispatching {} partitions",
            tasks.iter().filter(|t| !t.is_empty()).count()
        ));

        let started = Instant::now();
        let segments = self.client.dispatch_all(&tasks, scratch.path()).await?;
        metrics::record_dispatch_duration(tasks.len(), started.elapsed().as_secs_f64());
        metrics::record_scenes_rendered(mode::DISTRIBUTED, segments.len());

        let ordered = reassemble(segments, prepared.scenes.len(), self.config.gap_policy)?;
        logger.log_progress(&format!("reassembled {} segments", ordered.len()));

        let audio = prepared.audio.write_to(scratch).await?;
        let final_path = assemble(self.engine.as_ref(), &ordered, Some(&audio), scratch).await?;

        let file_name = format!("job_{}.mp4", id);
        scratch
            .persist(&final_path, &self.config.output_dir.join(&file_name))
            .await?;
        Ok(file_name)
    }

    async fn run_sync(
        &self,
        request_id: &str,
        prepared: &PreparedRender,
        logger: &JobLogger,
    ) -> PipelineResult<String> {
        let label = format!("sync-{}", request_id);
        let scratch = ScratchSpace::create(&self.config.scratch_root, &label).await?;
        let result = self.sync_stages(request_id, prepared, &scratch, logger).await;
        if let Err(e) = scratch.cleanup().await {
            logger.log_warning(&format!("scratch cleanup failed: {}", e));
        }
        result
    }

    async fn sync_stages(
        &self,
        request_id: &str,
        prepared: &PreparedRender,
        scratch: &ScratchSpace,
        logger: &JobLogger,
    ) -> PipelineResult<String> {
        let segments = self
            .renderer
            .render_all(&prepared.scenes, &prepared.assets, scratch.path())
            .await?;
        metrics::record_scenes_rendered(mode::SYNC, segments.len());

        let ordered = reassemble(segments, prepared.scenes.len(), self.config.gap_policy)?;
        logger.log_progress(&format!("rendered {} segments", ordered.len()));

        let audio = prepared.audio.write_to(scratch).await?;
        let final_path = assemble(self.engine.as_ref(), &ordered, Some(&audio), scratch).await?;

        let file_name = format!("merged_{}.mp4", request_id);
        scratch
            .persist(&final_path, &self.config.output_dir.join(&file_name))
            .await?;
        Ok(file_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_url() {
        assert_eq!(
            result_url("http://localhost:3000/", "job_1.mp4"),
            "http://localhost:3000/job_1.mp4"
        );
        assert_eq!(
            result_url("https://cdn.example", "merged_x.mp4"),
            "https://cdn.example/merged_x.mp4"
        );
    }

    #[test]
    fn test_missing_audio_is_rejected_first() {
        let request = RenderRequest {
            scenes: Vec::new(),
            ..Default::default()
        };
        let err = PreparedRender::from_request(request).err().unwrap();
        assert!(matches!(err, PipelineError::Client(ClientError::MissingAudio)));
    }

    #[test]
    fn test_empty_storyboard_is_a_client_error() {
        let request = RenderRequest {
            audio: Some(AudioTrack::new("voice.mp3", b"mp3".to_vec())),
            ..Default::default()
        };
        let err = PreparedRender::from_request(request).err().unwrap();
        assert!(err.is_client_error());
    }
}
