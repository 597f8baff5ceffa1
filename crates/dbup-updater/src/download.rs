//! Remote baseline download

use crate::error::{UpdaterError, UpdaterResult};
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;
use tokio::io::AsyncWriteExt;

/// Fetches a baseline dump to a local file.
#[async_trait]
pub trait BaselineDownloader: Send + Sync {
    /// Download `url` to `destination`, replacing it only on success.
    async fn download(&self, url: &str, destination: &Path) -> UpdaterResult<()>;
}

/// HTTPS downloader
pub struct HttpDownloader {
    http: reqwest::Client,
}

impl HttpDownloader {
    pub fn new() -> UpdaterResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(600))
            .connect_timeout(Duration::from_secs(30))
            .user_agent(concat!("dbup/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| UpdaterError::DownloadFailed {
                url: String::new(),
                reason: e.to_string(),
            })?;
        Ok(Self { http })
    }
}

#[async_trait]
impl BaselineDownloader for HttpDownloader {
    async fn download(&self, url: &str, destination: &Path) -> UpdaterResult<()> {
        let failed = |reason: String| UpdaterError::DownloadFailed {
            url: url.to_string(),
            reason,
        };

        log::info!("Downloading {url} ...");
        let mut response = self
            .http
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| failed(e.to_string()))?;

        let dir = destination
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| failed(format!("cannot create {}: {e}", dir.display())))?;

        // Stream into a temp file next to the destination, then rename it in place.
        let temp = tempfile::NamedTempFile::new_in(dir)
            .map_err(|e| failed(format!("cannot create temp file: {e}")))?;
        let (std_file, temp_path) = temp.into_parts();
        let mut file = tokio::fs::File::from_std(std_file);

        let mut written: u64 = 0;
        while let Some(chunk) = response.chunk().await.map_err(|e| failed(e.to_string()))? {
            file.write_all(&chunk)
                .await
                .map_err(|e| failed(e.to_string()))?;
            written += chunk.len() as u64;
        }
        file.flush().await.map_err(|e| failed(e.to_string()))?;
        drop(file);

        temp_path
            .persist(destination)
            .map_err(|e| failed(format!("cannot write {}: {e}", destination.display())))?;
        log::info!("Downloaded {written} bytes to {}", destination.display());
        Ok(())
    }
}
