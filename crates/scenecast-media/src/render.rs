//! Single-process scene rendering.
//!
//! Used by worker processes for their partition and by the synchronous
//! request path for a whole storyboard.

use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use scenecast_models::{AssetMap, RenderedSegment, Scene, SceneSource};

use crate::download::download_video;
use crate::engine::MediaEngine;
use crate::error::MediaResult;

/// File name of the rendered segment for a scene.
pub fn segment_file_name(order_index: usize) -> String {
    format!("scene_{}.mp4", order_index)
}

/// Renders scenes into fixed-duration segments inside a working directory.
#[derive(Clone)]
pub struct SceneRenderer {
    engine: Arc<dyn MediaEngine>,
    http: reqwest::Client,
}

impl SceneRenderer {
    pub fn new(engine: Arc<dyn MediaEngine>, http: reqwest::Client) -> Self {
        Self { engine, http }
    }

    /// Render one scene.
    ///
    /// Returns `Ok(None)` when an image scene's asset is not in `assets`; the
    /// scene is skipped rather than failing the batch.
    pub async fn render(
        &self,
        scene: &Scene,
        assets: &AssetMap,
        workdir: &Path,
    ) -> MediaResult<Option<RenderedSegment>> {
        let output = workdir.join(segment_file_name(scene.order_index));

        match &scene.source {
            SceneSource::RemoteVideo { url } => {
                let downloaded = workdir.join(format!("downloaded_{}.mp4", scene.order_index));
                download_video(&self.http, url, &downloaded).await?;
                self.engine
                    .render_looped_video(&downloaded, &output, scene.duration)
                    .await?;
                let _ = tokio::fs::remove_file(&downloaded).await;
            }
            SceneSource::StillImage { asset } => {
                let Some(bytes) = assets.get(asset) else {
                    warn!(
                        order_index = scene.order_index,
                        asset = %asset,
                        "Image asset missing, skipping scene"
                    );
                    return Ok(None);
                };
                let image = workdir.join(format!("image_{}", scene.order_index));
                tokio::fs::write(&image, bytes).await?;
                self.engine
                    .render_still_image(&image, &output, scene.duration)
                    .await?;
            }
        }

        Ok(Some(RenderedSegment::new(scene.order_index, output)))
    }

    /// Render scenes one after another in the given order.
    pub async fn render_all(
        &self,
        scenes: &[Scene],
        assets: &AssetMap,
        workdir: &Path,
    ) -> MediaResult<Vec<RenderedSegment>> {
        let mut segments = Vec::with_capacity(scenes.len());
        for (i, scene) in scenes.iter().enumerate() {
            info!(
                order_index = scene.order_index,
                "Rendering scene {}/{}",
                i + 1,
                scenes.len()
            );
            if let Some(segment) = self.render(scene, assets, workdir).await? {
                segments.push(segment);
            }
        }
        Ok(segments)
    }
}
