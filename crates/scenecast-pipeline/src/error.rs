//! Pipeline error types.

use thiserror::Error;

use scenecast_dispatch::DispatchError;
use scenecast_media::MediaError;
use scenecast_models::{JobId, JobStatus, SceneValidationError};

pub type PipelineResult<T> = Result<T, PipelineError>;

/// Problems with a submission. Reported synchronously; nothing is created.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("audio file is required")]
    MissingAudio,

    #[error("invalid scenes: {0}")]
    InvalidScenes(#[from] SceneValidationError),

    #[error("malformed scenes payload: {0}")]
    MalformedScenes(String),
}

/// Violations of the scene ordering invariants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReassemblyError {
    #[error("no segments were rendered")]
    Empty,

    #[error("scene {0} was rendered more than once")]
    Duplicate(usize),

    #[error("segment for scene {index} is outside a storyboard of {expected} scenes")]
    OutOfRange { index: usize, expected: usize },

    #[error("missing segments for scenes {0:?}")]
    Missing(Vec<usize>),
}

/// Preconditions of splitting a storyboard across workers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PartitionError {
    #[error("storyboard has no scenes")]
    NoScenes,

    #[error("no worker endpoints are configured")]
    NoWorkers,

    #[error("scene at position {position} has order index {found}")]
    NonContiguous { position: usize, found: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("job {0} not found")]
    NotFound(JobId),

    #[error("job {id} is already {status}")]
    AlreadyTerminal { id: JobId, status: JobStatus },
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("Partition failed: {0}")]
    Partition(#[from] PartitionError),

    #[error("Reassembly failed: {0}")]
    Reassembly(#[from] ReassemblyError),

    #[error("Dispatch failed: {0}")]
    Dispatch(#[from] DispatchError),

    #[error("Media error: {0}")]
    Media(#[from] MediaError),

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl PipelineError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Whether the caller's input was at fault.
    pub fn is_client_error(&self) -> bool {
        matches!(self, PipelineError::Client(_))
    }

    /// Pipeline stage the error belongs to, for metrics labels.
    pub fn stage(&self) -> &'static str {
        match self {
            PipelineError::Client(_) => "validation",
            PipelineError::Partition(_) => "partition",
            PipelineError::Dispatch(_) => "dispatch",
            PipelineError::Reassembly(_) => "reassembly",
            PipelineError::Media(_) => "media",
            PipelineError::Registry(_) => "registry",
            PipelineError::Config(_) => "config",
            PipelineError::Io(_) | PipelineError::Internal(_) => "internal",
        }
    }
}

impl From<SceneValidationError> for PipelineError {
    fn from(e: SceneValidationError) -> Self {
        Self::Client(ClientError::InvalidScenes(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_errors_are_flagged() {
        assert!(PipelineError::from(ClientError::MissingAudio).is_client_error());
        assert!(PipelineError::from(SceneValidationError::Empty).is_client_error());
        assert!(!PipelineError::from(ReassemblyError::Empty).is_client_error());
    }

    #[test]
    fn test_messages_carry_detail() {
        let err = PipelineError::from(ReassemblyError::Missing(vec![1, 4]));
        assert_eq!(err.to_string(), "Reassembly failed: missing segments for scenes [1, 4]");

        let err = PipelineError::from(DispatchError::Timeout {
            endpoint: "http://worker-2:4000/process-scenes".to_string(),
            secs: 600,
        });
        assert!(err.to_string().contains("http://worker-2:4000"));
    }
}
