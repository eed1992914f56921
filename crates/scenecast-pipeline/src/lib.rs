//! Distributed scene-rendering orchestration.
//!
//! This crate provides:
//! - Storyboard indexing and round-robin partitioning across workers
//! - Order-preserving reassembly of rendered segments
//! - Two-stage media assembly (concatenate, then mux audio)
//! - The job registry and the orchestrator driving jobs to completion
//! - A synchronous single-process rendering path

pub mod assemble;
pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod orchestrator;
pub mod partition;
pub mod reassemble;
pub mod registry;

pub use config::PipelineConfig;
pub use error::{
    ClientError, PartitionError, PipelineError, PipelineResult, ReassemblyError, RegistryError,
};
pub use logging::JobLogger;
pub use orchestrator::{result_url, AudioTrack, JobHandle, Orchestrator, RenderRequest};
pub use partition::{index_scenes, partition};
pub use reassemble::{reassemble, GapPolicy};
pub use registry::{InMemoryJobStore, JobStore};
