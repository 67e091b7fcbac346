//! Audio downloader backed by a hosted URL-to-MP3 conversion endpoint
//!
//! The endpoint takes the source URL and an access token as query
//! parameters and answers with a streamable MP3 body, which is written
//! straight to the staging directory.

use crate::config::DownloadConfig;
use crate::error::DownloadError;
use crate::sanitize::resolve_track_name;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

#[derive(Debug)]
pub struct Download {
    pub audio_path: PathBuf,
    pub track_name: String,
}

#[derive(Debug)]
pub struct Downloader {
    client: reqwest::Client,
    endpoint: String,
    access_token: Option<String>,
    staging_dir: PathBuf,
    timeout: Duration,
}

impl Downloader {
    pub fn new(config: &DownloadConfig, staging_dir: PathBuf, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: config.endpoint.clone(),
            access_token: config.access_token.clone(),
            staging_dir,
            timeout,
        }
    }

    /// Staging path for a (possibly unsanitized) requested name.
    pub fn staging_path(&self, requested_name: &str) -> PathBuf {
        self.staging_dir
            .join(format!("{}.mp3", resolve_track_name(requested_name)))
    }

    /// Fetch the audio for `url` and stage it as `<name>.mp3`.
    ///
    /// A rerun with the same name overwrites in place. Failures leave no
    /// partial staging file behind and are not retried.
    pub async fn fetch(&self, url: &str, requested_name: &str) -> Result<Download, DownloadError> {
        let track_name = resolve_track_name(requested_name);
        let audio_path = self.staging_dir.join(format!("{track_name}.mp3"));

        let token = self
            .access_token
            .as_deref()
            .ok_or(DownloadError::MissingToken)?;

        fs::create_dir_all(&self.staging_dir).await?;
        if fs::try_exists(&audio_path).await? {
            fs::remove_file(&audio_path).await?;
        }

        info!("Downloading {} as {}", url, track_name);

        let result = tokio::time::timeout(
            self.timeout,
            self.stream_to_file(url, token, &audio_path),
        )
        .await;

        match result {
            Ok(Ok(())) => {
                debug!("Staged audio at {}", audio_path.display());
                Ok(Download {
                    audio_path,
                    track_name,
                })
            }
            Ok(Err(e)) => {
                let _ = fs::remove_file(&audio_path).await;
                Err(e)
            }
            Err(_) => {
                let _ = fs::remove_file(&audio_path).await;
                Err(DownloadError::TimedOut(self.timeout.as_secs()))
            }
        }
    }

    async fn stream_to_file(
        &self,
        url: &str,
        token: &str,
        dest: &Path,
    ) -> Result<(), DownloadError> {
        let mut response = self
            .client
            .get(&self.endpoint)
            .query(&[("url", url), ("csrfToken", token)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::EndpointStatus(status.as_u16()));
        }

        let mut file = fs::File::create(dest).await?;
        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk).await?;
        }
        file.flush().await?;
        Ok(())
    }
}

/// Cheap sanity check before a URL is handed to the conversion endpoint.
pub fn validate_source_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sanitize::FALLBACK_NAME;

    fn downloader() -> Downloader {
        let config = DownloadConfig {
            endpoint: "https://converter.invalid/api/mp3".to_string(),
            access_token: None,
        };
        Downloader::new(&config, PathBuf::from("/work/src"), Duration::from_secs(5))
    }

    #[test]
    fn test_staging_path_sanitizes() {
        let d = downloader();
        assert_eq!(
            d.staging_path("Sem  Limites!!"),
            PathBuf::from("/work/src/Sem_Limites.mp3")
        );
        assert_eq!(
            d.staging_path(""),
            PathBuf::from(format!("/work/src/{FALLBACK_NAME}.mp3"))
        );
    }

    #[tokio::test]
    async fn test_fetch_requires_token() {
        let d = downloader();
        let err = d
            .fetch("https://youtube.com/watch?v=abc", "Test Song")
            .await
            .unwrap_err();
        assert!(matches!(err, DownloadError::MissingToken));
    }

    #[test]
    fn test_validate_source_url() {
        assert!(validate_source_url("https://www.youtube.com/watch?v=dQw4w9WgXcQ"));
        assert!(validate_source_url("http://youtu.be/dQw4w9WgXcQ"));
        assert!(!validate_source_url("youtube.com/watch?v=dQw4w9WgXcQ"));
        assert!(!validate_source_url(""));
    }
}
