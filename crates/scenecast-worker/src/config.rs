//! Worker server configuration.

use std::path::PathBuf;
use std::time::Duration;

/// Worker server configuration.
#[derive(Debug, Clone)]
pub struct WorkerServerConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// Parent directory for per-request scratch spaces
    pub scratch_root: PathBuf,
    /// Timeout for one FFmpeg invocation
    pub encoder_timeout: Duration,
    /// Timeout for downloading one source clip
    pub download_timeout: Duration,
    /// Max request body size; partitions carry their images inline
    pub max_body_size: usize,
}

impl Default for WorkerServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 4000,
            scratch_root: std::env::temp_dir().join("scenecast-worker"),
            encoder_timeout: Duration::from_secs(1800), // 30 minutes
            download_timeout: Duration::from_secs(300),
            max_body_size: 200 * 1024 * 1024, // 200MB
        }
    }
}

impl WorkerServerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("WORKER_HOST").unwrap_or(defaults.host),
            port: std::env::var("WORKER_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.port),
            scratch_root: std::env::var("SCRATCH_ROOT")
                .map(PathBuf::from)
                .unwrap_or(defaults.scratch_root),
            encoder_timeout: Duration::from_secs(
                std::env::var("ENCODER_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(1800),
            ),
            download_timeout: Duration::from_secs(
                std::env::var("DOWNLOAD_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(300),
            ),
            max_body_size: std::env::var("MAX_BODY_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_body_size),
        }
    }
}
