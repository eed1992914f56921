//! Worker HTTP client.

use std::path::Path;
use std::time::{Duration, Instant};

use futures::future::join_all;
use reqwest::Client;
use tracing::{debug, info, warn};

use scenecast_models::{decode_payload, RenderedSegment, WorkerRequest, WorkerResponse, WorkerTask};

use crate::error::{DispatchError, DispatchResult};

/// Longest worker error body echoed into an error message.
const MAX_ERROR_BODY: usize = 512;

/// Configuration for the dispatch client.
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// Whole-request timeout per worker call
    pub request_timeout: Duration,
    /// TCP connect timeout per worker call
    pub connect_timeout: Duration,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(600), // rendering a partition is slow
            connect_timeout: Duration::from_secs(10),
        }
    }
}

/// Client performing one round trip per worker partition.
#[derive(Debug, Clone)]
pub struct WorkerClient {
    http: Client,
    config: DispatchConfig,
}

impl WorkerClient {
    /// Create a new worker client.
    pub fn new(config: DispatchConfig) -> DispatchResult<Self> {
        let http = Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(DispatchError::Client)?;

        Ok(Self { http, config })
    }

    /// Send every non-empty task concurrently and wait for all of them.
    ///
    /// Fails if any call fails, reporting the first failure in worker order;
    /// segments from successful workers are discarded in that case.
    pub async fn dispatch_all(
        &self,
        tasks: &[WorkerTask],
        workdir: &Path,
    ) -> DispatchResult<Vec<RenderedSegment>> {
        let active: Vec<&WorkerTask> = tasks.iter().filter(|t| !t.is_empty()).collect();
        info!(
            workers = active.len(),
            skipped = tasks.len() - active.len(),
            "Dispatching partitions"
        );

        let calls = active.iter().map(|task| self.render_partition(task, workdir));
        let results = join_all(calls).await;

        let mut segments = Vec::new();
        let mut first_error = None;
        for result in results {
            match result {
                Ok(batch) => segments.extend(batch),
                Err(e) => {
                    warn!(
                        worker = e.endpoint().unwrap_or_default(),
                        error = %e,
                        "Worker call failed"
                    );
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(segments),
        }
    }

    /// Send one partition to its worker and store the returned segments.
    pub async fn render_partition(
        &self,
        task: &WorkerTask,
        workdir: &Path,
    ) -> DispatchResult<Vec<RenderedSegment>> {
        let endpoint = task.target_worker.as_str();
        let started = Instant::now();
        debug!(
            worker = %endpoint,
            scenes = task.scenes.len(),
            assets = task.assets.len(),
            "Sending partition"
        );

        let response = self
            .http
            .post(endpoint)
            .json(&WorkerRequest::from_task(task))
            .send()
            .await
            .map_err(|e| self.transport_error(endpoint, e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| self.transport_error(endpoint, e))?;

        if !status.is_success() {
            return Err(DispatchError::Rejected {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
                body: truncate(&body, MAX_ERROR_BODY),
            });
        }

        let parsed: WorkerResponse =
            serde_json::from_str(&body).map_err(|e| DispatchError::InvalidResponse {
                endpoint: endpoint.to_string(),
                message: e.to_string(),
            })?;

        let mut segments = Vec::with_capacity(parsed.processed_scenes.len());
        for processed in parsed.processed_scenes {
            let order_index = processed.order_index;
            if !task.owns(order_index) {
                return Err(DispatchError::Unassigned {
                    endpoint: endpoint.to_string(),
                    order_index,
                });
            }

            let bytes = decode_payload(&processed.video_data).map_err(|e| DispatchError::Decode {
                endpoint: endpoint.to_string(),
                order_index,
                source: e,
            })?;

            let path = workdir.join(format!("w{}_scene_{}.mp4", task.worker_index, order_index));
            tokio::fs::write(&path, &bytes)
                .await
                .map_err(|e| DispatchError::Io {
                    endpoint: endpoint.to_string(),
                    source: e,
                })?;
            segments.push(RenderedSegment::new(order_index, path));
        }

        info!(
            worker = %endpoint,
            segments = segments.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Partition rendered"
        );
        Ok(segments)
    }

    fn transport_error(&self, endpoint: &str, e: reqwest::Error) -> DispatchError {
        if e.is_timeout() {
            DispatchError::Timeout {
                endpoint: endpoint.to_string(),
                secs: self.config.request_timeout.as_secs(),
            }
        } else {
            DispatchError::Transport {
                endpoint: endpoint.to_string(),
                source: e,
            }
        }
    }
}

fn truncate(body: &str, max: usize) -> String {
    match body.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = DispatchConfig::default();
        assert_eq!(config.request_timeout, Duration::from_secs(600));
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdef", 3), "abc...");
    }
}
