//! Storyboard uploads.
//!
//! A submission is a multipart form with:
//! - `scenes`: JSON array of scenes (`paragraph`, `videoUrl` or `imageFile`, `duration`)
//! - `audioFile`: the narration track
//! - one file field per image, named as the scene's `imageFile` refers to it

use axum::extract::Multipart;
use axum::http::{header, HeaderMap};
use tracing::debug;

use scenecast_models::{AssetMap, AssetRef, SceneInput};
use scenecast_pipeline::{AudioTrack, ClientError, PipelineError, RenderRequest};

use crate::error::{ApiError, ApiResult};

pub const SCENES_FIELD: &str = "scenes";
pub const AUDIO_FIELD: &str = "audioFile";

/// Read a multipart storyboard submission.
pub async fn read_render_request(mut multipart: Multipart) -> ApiResult<RenderRequest> {
    let mut scenes_json = None;
    let mut assets = AssetMap::new();
    let mut audio = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("invalid multipart body: {}", e)))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        match name.as_str() {
            SCENES_FIELD => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("unreadable scenes field: {}", e)))?;
                scenes_json = Some(text);
            }
            AUDIO_FIELD => {
                let file_name = field.file_name().unwrap_or("audio").to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("unreadable audio upload: {}", e)))?;
                if !data.is_empty() {
                    audio = Some(AudioTrack::new(file_name, data.to_vec()));
                }
            }
            _ => {
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| {
                        ApiError::bad_request(format!("unreadable upload {}: {}", name, e))
                    })?;
                debug!(field = %name, bytes = data.len(), "Received image asset");
                assets.insert(AssetRef::new(name), data.to_vec());
            }
        }
    }

    let scenes = match scenes_json {
        Some(text) => parse_scenes(&text)?,
        None => Vec::new(),
    };

    Ok(RenderRequest {
        scenes,
        assets,
        audio,
    })
}

/// Parse the `scenes` field.
pub fn parse_scenes(text: &str) -> ApiResult<Vec<SceneInput>> {
    serde_json::from_str(text)
        .map_err(|e| PipelineError::from(ClientError::MalformedScenes(e.to_string())).into())
}

/// `{scheme}://{host}` of the incoming request, as seen by the client.
pub fn base_url(headers: &HeaderMap) -> String {
    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or("http");

    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("localhost");

    format!("{}://{}", scheme, host)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_base_url_defaults_to_http() {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, HeaderValue::from_static("render.example:3000"));
        assert_eq!(base_url(&headers), "http://render.example:3000");
    }

    #[test]
    fn test_base_url_honours_forwarded_proto() {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, HeaderValue::from_static("render.example"));
        headers.insert("x-forwarded-proto", HeaderValue::from_static("https, http"));
        assert_eq!(base_url(&headers), "https://render.example");
    }

    #[test]
    fn test_parse_scenes() {
        let body = serde_json::json!([
            { "paragraph": "intro", "imageFile": "image0", "duration": 2 },
            { "videoUrl": "https://cdn.example/a.mp4", "duration": 4.5 }
        ]);
        let scenes = parse_scenes(&body.to_string()).unwrap();
        assert_eq!(scenes.len(), 2);
        assert_eq!(scenes[0].image_file.as_deref(), Some("image0"));
        assert_eq!(scenes[1].duration, 4.5);

        let err = parse_scenes("{not json").unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);
    }
}
