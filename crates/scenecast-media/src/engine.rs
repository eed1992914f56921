//! Media Encoding Engine adapter.
//!
//! The pipeline only talks to [`MediaEngine`]; [`FfmpegEngine`] is the
//! production implementation backed by the FFmpeg CLI.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::info;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::MediaResult;

/// Output frame size for still-image scenes.
pub const FRAME_WIDTH: u32 = 1280;
pub const FRAME_HEIGHT: u32 = 720;
/// Output frame rate for still-image scenes.
pub const FRAME_RATE: u32 = 30;

/// Encoding capabilities the orchestration pipeline depends on.
#[async_trait]
pub trait MediaEngine: Send + Sync {
    /// Loop a video clip (without audio) until it lasts `duration` seconds.
    async fn render_looped_video(
        &self,
        input: &Path,
        output: &Path,
        duration: f64,
    ) -> MediaResult<()>;

    /// Animate a still image into a `duration`-second clip.
    async fn render_still_image(
        &self,
        image: &Path,
        output: &Path,
        duration: f64,
    ) -> MediaResult<()>;

    /// Concatenate segments in list order without re-encoding.
    async fn concat(&self, segments: &[PathBuf], output: &Path) -> MediaResult<()>;

    /// Copy the video stream of `video` and replace its audio with `audio`.
    async fn mux_audio(&self, video: &Path, audio: &Path, output: &Path) -> MediaResult<()>;
}

/// [`MediaEngine`] backed by the `ffmpeg` binary.
#[derive(Debug, Clone, Default)]
pub struct FfmpegEngine {
    runner: FfmpegRunner,
}

impl FfmpegEngine {
    /// Kill any single FFmpeg invocation that runs longer than `secs`.
    pub fn with_timeout(secs: u64) -> Self {
        Self {
            runner: FfmpegRunner::new().with_timeout(secs),
        }
    }
}

#[async_trait]
impl MediaEngine for FfmpegEngine {
    async fn render_looped_video(
        &self,
        input: &Path,
        output: &Path,
        duration: f64,
    ) -> MediaResult<()> {
        info!(
            "Rendering video scene: {} -> {} ({:.2}s)",
            input.display(),
            output.display(),
            duration
        );
        self.runner.run(&looped_video_command(input, output, duration)).await
    }

    async fn render_still_image(
        &self,
        image: &Path,
        output: &Path,
        duration: f64,
    ) -> MediaResult<()> {
        info!(
            "Rendering image scene: {} -> {} ({:.2}s)",
            image.display(),
            output.display(),
            duration
        );
        self.runner.run(&still_image_command(image, output, duration)).await
    }

    async fn concat(&self, segments: &[PathBuf], output: &Path) -> MediaResult<()> {
        let list_path = output.with_extension("concat.txt");
        tokio::fs::write(&list_path, concat_list_body(segments)).await?;

        info!("Concatenating {} segments into {}", segments.len(), output.display());
        let result = self.runner.run(&concat_command(&list_path, output)).await;

        let _ = tokio::fs::remove_file(&list_path).await;
        result
    }

    async fn mux_audio(&self, video: &Path, audio: &Path, output: &Path) -> MediaResult<()> {
        info!("Muxing audio {} into {}", audio.display(), output.display());
        self.runner.run(&mux_audio_command(video, audio, output)).await
    }
}

/// `-stream_loop -1 -i input -an -t duration -c:v libx264 output`
pub fn looped_video_command(input: &Path, output: &Path, duration: f64) -> FfmpegCommand {
    FfmpegCommand::new(output)
        .input_with_args(["-stream_loop", "-1"], input)
        .no_audio()
        .duration(duration)
        .video_codec("libx264")
        .pixel_format("yuv420p")
}

/// Still image fitted into the frame over a blurred, stretched copy of itself.
pub fn still_image_command(image: &Path, output: &Path, duration: f64) -> FfmpegCommand {
    FfmpegCommand::new(output)
        .input_with_args(
            [
                "-loop".to_string(),
                "1".to_string(),
                "-framerate".to_string(),
                format!("1/{}", duration),
            ],
            image,
        )
        .filter_complex(still_image_filter())
        .duration(duration)
        .video_codec("libx264")
        .frame_rate(FRAME_RATE)
        .pixel_format("yuv420p")
}

const FAST_SCALE: &str = "flags=fast_bilinear";
const CENTERED: &str = "x=(main_w-overlay_w)/2:y=(main_h-overlay_h)/2";

/// Filter graph for still-image scenes.
pub fn still_image_filter() -> String {
    let (w, h) = (FRAME_WIDTH, FRAME_HEIGHT);
    [
        format!("[0:v]scale={w}:{h}:force_original_aspect_ratio=decrease:{FAST_SCALE}[scaled]"),
        "[scaled]split[original][copy]".to_string(),
        format!("[copy]scale=32:18:force_original_aspect_ratio=increase:{FAST_SCALE}[scaled_copy]"),
        "[scaled_copy]gblur=sigma=10[blurred]".to_string(),
        format!("[blurred]scale={w}:{h}:{FAST_SCALE}[backdrop]"),
        format!("[backdrop][original]overlay={CENTERED}[overlaid]"),
        "[overlaid]setsar=1".to_string(),
    ]
    .join(";")
}

/// Concat demuxer over a list file, stream copy.
pub fn concat_command(list_path: &Path, output: &Path) -> FfmpegCommand {
    FfmpegCommand::new(output)
        .input_with_args(["-f", "concat", "-safe", "0"], list_path)
        .codec_copy()
}

/// Video copied from the first input, audio from the second re-encoded to AAC.
pub fn mux_audio_command(video: &Path, audio: &Path, output: &Path) -> FfmpegCommand {
    FfmpegCommand::new(output)
        .input(video)
        .input(audio)
        .output_args(["-map", "0:v:0", "-map", "1:a:0"])
        .video_codec("copy")
        .audio_codec("aac")
}

/// Body of a concat demuxer list file.
pub fn concat_list_body(segments: &[PathBuf]) -> String {
    segments
        .iter()
        .map(|p| format!("file '{}'\n", p.to_string_lossy().replace('\'', r"'\''")))
        .collect()
}
