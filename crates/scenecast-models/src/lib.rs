//! Shared data models for the SceneCast backend.
//!
//! This crate provides Serde-serializable types for:
//! - Storyboard scenes and their sources
//! - Worker partitions and rendered segments
//! - Job lifecycle records
//! - The worker request/response wire contract

pub mod job;
pub mod scene;
pub mod task;
pub mod wire;

// Re-export common types
pub use job::{Job, JobId, JobOutcome, JobStatus};
pub use scene::{AssetMap, AssetRef, Scene, SceneInput, SceneSource, SceneValidationError};
pub use task::{RenderedSegment, WorkerTask};
pub use wire::{decode_payload, encode_payload, ProcessedScene, WorkerRequest, WorkerResponse};
