//! Render worker server.
//!
//! Receives one partition of a storyboard at a time, renders its scenes
//! sequentially in a private scratch directory and returns the segments.

pub mod config;
pub mod error;
pub mod server;

pub use config::WorkerServerConfig;
pub use error::{WorkerServerError, WorkerServerResult};
pub use server::{create_router, WorkerState};
