//! Pipeline configuration.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use url::Url;

use crate::error::{PipelineError, PipelineResult};
use crate::reassemble::GapPolicy;

/// Pipeline configuration shared by every job.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Render worker endpoints, in pool order
    pub worker_endpoints: Arc<[String]>,
    /// Parent directory for per-job scratch spaces
    pub scratch_root: PathBuf,
    /// Directory final videos are published to
    pub output_dir: PathBuf,
    /// Timeout for one worker round trip
    pub worker_timeout: Duration,
    /// Timeout for one FFmpeg invocation
    pub encoder_timeout: Duration,
    /// What to do when scenes are missing after dispatch
    pub gap_policy: GapPolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            worker_endpoints: Arc::from(Vec::new()),
            scratch_root: std::env::temp_dir().join("scenecast"),
            output_dir: PathBuf::from("public"),
            worker_timeout: Duration::from_secs(600),
            encoder_timeout: Duration::from_secs(1800), // 30 minutes
            gap_policy: GapPolicy::Reject,
        }
    }
}

impl PipelineConfig {
    /// Create config from environment variables.
    pub fn from_env() -> PipelineResult<Self> {
        let defaults = Self::default();

        let worker_endpoints = match std::env::var("WORKER_ENDPOINTS") {
            Ok(raw) => parse_endpoints(&raw)?,
            Err(_) => Vec::new(),
        };

        Ok(Self {
            worker_endpoints: Arc::from(worker_endpoints),
            scratch_root: std::env::var("SCRATCH_ROOT")
                .map(PathBuf::from)
                .unwrap_or(defaults.scratch_root),
            output_dir: std::env::var("OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
            worker_timeout: Duration::from_secs(
                std::env::var("WORKER_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(600),
            ),
            encoder_timeout: Duration::from_secs(
                std::env::var("ENCODER_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(1800),
            ),
            gap_policy: if env_flag("ALLOW_SEGMENT_GAPS") {
                GapPolicy::Tolerate
            } else {
                GapPolicy::Reject
            },
        })
    }

    pub fn with_workers<I, S>(mut self, endpoints: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let endpoints: Vec<String> = endpoints.into_iter().map(Into::into).collect();
        self.worker_endpoints = Arc::from(endpoints);
        self
    }
}

/// Parse a comma-separated list of worker URLs.
pub fn parse_endpoints(raw: &str) -> PipelineResult<Vec<String>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            let url = Url::parse(s)
                .map_err(|e| {
                    PipelineError::config(format!("invalid worker endpoint '{}': {}", s, e))
                })?;
            match url.scheme() {
                "http" | "https" => Ok(s.to_string()),
                other => Err(PipelineError::config(format!(
                    "worker endpoint '{}' has unsupported scheme {}",
                    s, other
                ))),
            }
        })
        .collect()
}

fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}
