//! Worker Dispatch Client.
//!
//! Sends scene partitions to remote render workers over HTTP, waits for every
//! worker to answer, and stores the returned segments in a job's scratch
//! directory.

pub mod client;
pub mod error;

pub use client::{DispatchConfig, WorkerClient};
pub use error::{DispatchError, DispatchResult};
