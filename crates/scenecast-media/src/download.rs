//! Remote source video download.

use std::path::Path;

use futures::StreamExt;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::info;

use crate::error::{MediaError, MediaResult};

/// Stream `url` into `dest`.
pub async fn download_video(http: &reqwest::Client, url: &str, dest: &Path) -> MediaResult<u64> {
    info!("Downloading source video {} -> {}", url, dest.display());

    let response = http
        .get(url)
        .send()
        .await
        .map_err(|e| MediaError::download_failed(format!("{}: {}", url, e)))?;

    if !response.status().is_success() {
        return Err(MediaError::download_failed(format!(
            "{} returned {}",
            url,
            response.status()
        )));
    }

    let mut file = File::create(dest).await?;
    let mut written = 0u64;
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| MediaError::download_failed(format!("{}: {}", url, e)))?;
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;

    if written == 0 {
        return Err(MediaError::download_failed(format!("{} returned an empty body", url)));
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_download_writes_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/clip.mp4"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"mp4-bytes".to_vec()))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("downloaded_0.mp4");
        let url = format!("{}/clip.mp4", server.uri());
        let written = download_video(&reqwest::Client::new(), &url, &dest).await.unwrap();

        assert_eq!(written, 9);
        assert_eq!(tokio::fs::read(&dest).await.unwrap(), b"mp4-bytes");
    }

    #[tokio::test]
    async fn test_download_rejects_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let err = download_video(
            &reqwest::Client::new(),
            &format!("{}/missing.mp4", server.uri()),
            &dir.path().join("x.mp4"),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, MediaError::DownloadFailed { .. }));
        assert!(err.to_string().contains("404"));
    }
}
