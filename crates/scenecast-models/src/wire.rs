//! Worker wire contract.
//!
//! Binary payloads (image assets on the way out, rendered segments on the way
//! back) travel as standard base64 inside JSON bodies.

use std::collections::BTreeMap;

use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};

use crate::scene::{AssetMap, AssetRef, Scene};
use crate::task::WorkerTask;

/// Encode raw bytes for transport.
pub fn encode_payload(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Decode a transported payload back to raw bytes.
pub fn decode_payload(text: &str) -> Result<Vec<u8>, base64::DecodeError> {
    STANDARD.decode(text.trim())
}

/// Body sent to a worker for one partition.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerRequest {
    pub scenes: Vec<Scene>,
    #[serde(default)]
    pub assets: BTreeMap<String, String>,
}

impl WorkerRequest {
    pub fn from_task(task: &WorkerTask) -> Self {
        Self {
            scenes: task.scenes.clone(),
            assets: task
                .assets
                .iter()
                .map(|(reference, bytes)| (reference.0.clone(), encode_payload(bytes)))
                .collect(),
        }
    }

    /// Decode the inline assets. Fails on the first undecodable entry.
    pub fn decode_assets(&self) -> Result<AssetMap, (String, base64::DecodeError)> {
        self.assets
            .iter()
            .map(|(reference, text)| {
                decode_payload(text)
                    .map(|bytes| (AssetRef(reference.clone()), bytes))
                    .map_err(|e| (reference.clone(), e))
            })
            .collect()
    }
}

/// One rendered scene as returned by a worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedScene {
    pub order_index: usize,
    /// Base64-encoded video segment.
    pub video_data: String,
}

/// Body returned by a worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerResponse {
    pub processed_scenes: Vec<ProcessedScene>,
}
