//! FFmpeg CLI wrapper and scene rendering.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building with multiple inputs
//! - Progress parsing from `-progress pipe:2` and stderr diagnostics capture
//! - The [`MediaEngine`] seam used by the orchestration pipeline
//! - Per-job scratch directories
//! - Scene rendering (looped video clips and animated stills)

pub mod command;
pub mod download;
pub mod engine;
pub mod error;
pub mod progress;
pub mod render;
pub mod scratch;

pub use command::{check_ffmpeg, FfmpegCommand, FfmpegRunner};
pub use download::download_video;
pub use engine::{FfmpegEngine, MediaEngine};
pub use error::{MediaError, MediaResult};
pub use progress::FfmpegProgress;
pub use render::{segment_file_name, SceneRenderer};
pub use scratch::ScratchSpace;
