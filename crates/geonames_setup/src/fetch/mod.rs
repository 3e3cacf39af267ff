use std::path::Path;

use reqwest::{Client, StatusCode};
use tokio::{fs, io::AsyncWriteExt};
use tracing::info;

use crate::error::DownloadError;

/// Whole-body HTTP downloads. Each payload is buffered in memory before it
/// touches the disk.
#[derive(Debug, Clone)]
pub struct Downloader {
    http: Client,
}

impl Downloader {
    pub fn new() -> anyhow::Result<Self> {
        let http = Client::builder()
            .user_agent(concat!("geonames-setup/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { http })
    }

    pub async fn fetch(&self, url: &str) -> Result<Vec<u8>, DownloadError> {
        let transport = |source| DownloadError::Transport {
            url: url.to_string(),
            source,
        };

        let response = self.http.get(url).send().await.map_err(transport)?;
        match response.status() {
            status if status.is_success() => {}
            StatusCode::NOT_FOUND => {
                return Err(DownloadError::NotFound {
                    url: url.to_string(),
                });
            }
            status => {
                return Err(DownloadError::Status {
                    url: url.to_string(),
                    status: status.as_u16(),
                });
            }
        }

        let body = response.bytes().await.map_err(transport)?;
        Ok(body.to_vec())
    }

    /// Downloads `url` and writes the body to `dest`, returning the byte count.
    ///
    /// Nothing is written unless the whole body arrived.
    pub async fn fetch_to(&self, url: &str, dest: &Path) -> Result<u64, DownloadError> {
        let body = self.fetch(url).await?;
        let write = |source| DownloadError::Write {
            path: dest.to_path_buf(),
            source,
        };

        let mut file = fs::File::create(dest).await.map_err(write)?;
        file.write_all(&body).await.map_err(write)?;
        file.flush().await.map_err(write)?;

        info!(url = %url, bytes = body.len(), path = ?dest, "download complete");
        Ok(body.len() as u64)
    }
}
