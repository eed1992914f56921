//! Scene Partitioner.
//!
//! Scenes are dealt round-robin: scene `i` goes to worker `i mod W`. Each task
//! carries only the image assets its own scenes reference.

use tracing::warn;

use scenecast_models::{AssetMap, Scene, SceneInput, SceneValidationError, WorkerTask};

use crate::error::PartitionError;

/// Validate a submission and stamp each scene with its position.
pub fn index_scenes(inputs: Vec<SceneInput>) -> Result<Vec<Scene>, SceneValidationError> {
    if inputs.is_empty() {
        return Err(SceneValidationError::Empty);
    }

    inputs
        .into_iter()
        .enumerate()
        .map(|(i, input)| input.into_scene(i))
        .collect()
}

/// Split `scenes` into exactly one task per worker.
///
/// `scenes` must be in order with indices `0..N`. Tasks may be empty when
/// there are more workers than scenes. An image scene whose asset is absent
/// is left out of every task.
pub fn partition(
    scenes: &[Scene],
    workers: &[String],
    assets: &AssetMap,
) -> Result<Vec<WorkerTask>, PartitionError> {
    if scenes.is_empty() {
        return Err(PartitionError::NoScenes);
    }
    if workers.is_empty() {
        return Err(PartitionError::NoWorkers);
    }

    for (position, scene) in scenes.iter().enumerate() {
        if scene.order_index != position {
            return Err(PartitionError::NonContiguous {
                position,
                found: scene.order_index,
            });
        }
    }

    let mut tasks: Vec<WorkerTask> = workers
        .iter()
        .enumerate()
        .map(|(i, endpoint)| WorkerTask::new(endpoint.clone(), i))
        .collect();

    for scene in scenes {
        let task = &mut tasks[scene.order_index % workers.len()];

        if let Some(asset) = scene.source.asset() {
            let Some(bytes) = assets.get(asset) else {
                warn!(
                    order_index = scene.order_index,
                    asset = %asset,
                    "Image asset missing, dropping scene from partition"
                );
                continue;
            };
            task.assets.insert(asset.clone(), bytes.clone());
        }

        task.scenes.push(scene.clone());
    }

    Ok(tasks)
}
