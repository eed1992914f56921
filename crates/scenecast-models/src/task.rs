//! Partitioned work and rendered output.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::scene::{AssetMap, Scene};

/// One partition of a storyboard routed to one worker.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkerTask {
    /// Endpoint the partition is sent to.
    pub target_worker: String,
    /// Position of the worker in the configured pool.
    pub worker_index: usize,
    /// Scenes in submission order, each keeping its original index.
    pub scenes: Vec<Scene>,
    /// Exactly the assets referenced by `scenes`.
    pub assets: AssetMap,
}

impl WorkerTask {
    pub fn new(target_worker: impl Into<String>, worker_index: usize) -> Self {
        Self {
            target_worker: target_worker.into(),
            worker_index,
            scenes: Vec::new(),
            assets: AssetMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    /// Whether this task was assigned the scene with `order_index`.
    pub fn owns(&self, order_index: usize) -> bool {
        self.scenes.iter().any(|s| s.order_index == order_index)
    }
}

/// A rendered clip for exactly one scene, stored in a job's scratch space.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedSegment {
    pub order_index: usize,
    pub local_path: PathBuf,
}

impl RenderedSegment {
    pub fn new(order_index: usize, local_path: impl Into<PathBuf>) -> Self {
        Self {
            order_index,
            local_path: local_path.into(),
        }
    }
}
