//! Application state.

use std::sync::Arc;

use scenecast_pipeline::{Orchestrator, PipelineConfig, PipelineResult};

use crate::config::ApiConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub orchestrator: Arc<Orchestrator>,
}

impl AppState {
    pub fn new(config: ApiConfig, orchestrator: Arc<Orchestrator>) -> Self {
        Self { config, orchestrator }
    }

    /// State backed by the FFmpeg engine and an in-memory job registry.
    pub fn from_config(config: ApiConfig, pipeline: PipelineConfig) -> PipelineResult<Self> {
        let orchestrator = Orchestrator::from_config(pipeline)?;
        Ok(Self::new(config, Arc::new(orchestrator)))
    }
}
