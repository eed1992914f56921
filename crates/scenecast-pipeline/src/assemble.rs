//! Two-stage media assembly: concatenate segments, then mux the audio track.

use std::path::{Path, PathBuf};

use tracing::info;

use scenecast_media::{MediaEngine, MediaError, ScratchSpace};
use scenecast_models::RenderedSegment;

use crate::error::PipelineResult;

const CONCAT_FILE: &str = "concatenated.mp4";
const FINAL_FILE: &str = "final.mp4";

/// Join ordered segments into one video without re-encoding.
///
/// Every segment must exist before the engine is invoked.
pub async fn concatenate(
    engine: &dyn MediaEngine,
    segments: &[RenderedSegment],
    output: &Path,
) -> PipelineResult<()> {
    let mut paths = Vec::with_capacity(segments.len());
    for segment in segments {
        ensure_exists(&segment.local_path).await?;
        paths.push(segment.local_path.clone());
    }

    engine.concat(&paths, output).await?;
    ensure_exists(output).await
}

/// Attach `audio` to `video`, writing `output`.
///
/// Without audio the concatenated video is moved into place unchanged.
pub async fn mux_audio(
    engine: &dyn MediaEngine,
    video: &Path,
    audio: Option<&Path>,
    output: &Path,
) -> PipelineResult<()> {
    ensure_exists(video).await?;

    match audio {
        Some(audio) => {
            ensure_exists(audio).await?;
            engine.mux_audio(video, audio, output).await?;
            ensure_exists(output).await
        }
        None => {
            tokio::fs::rename(video, output).await?;
            Ok(())
        }
    }
}

/// Run both stages inside `scratch` and return the path of the final video.
pub async fn assemble(
    engine: &dyn MediaEngine,
    segments: &[RenderedSegment],
    audio: Option<&Path>,
    scratch: &ScratchSpace,
) -> PipelineResult<PathBuf> {
    let concatenated = scratch.join(CONCAT_FILE);
    let output = scratch.join(FINAL_FILE);

    info!(segments = segments.len(), "Concatenating segments");
    concatenate(engine, segments, &concatenated).await?;

    info!(with_audio = audio.is_some(), "Muxing final video");
    mux_audio(engine, &concatenated, audio, &output).await?;

    Ok(output)
}

async fn ensure_exists(path: &Path) -> PipelineResult<()> {
    if tokio::fs::try_exists(path).await? {
        Ok(())
    } else {
        Err(MediaError::FileNotFound(path.to_path_buf()).into())
    }
}
