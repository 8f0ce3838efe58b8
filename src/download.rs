use async_trait::async_trait;
use futures::stream::StreamExt;
use reqwest::{Error as ReqwestError, StatusCode};
use std::path::{Path, PathBuf};
use thiserror::Error as ThisError;
use tokio::io::AsyncWriteExt;
use url::Url;

#[derive(ThisError, Debug)]
pub enum DownloadError {
    #[error("Invalid code uri {uri}: {source}")]
    InvalidUri {
        uri: String,
        #[source]
        source: url::ParseError,
    },
    #[error("Failed to download {uri}: {source}")]
    HttpError {
        uri: String,
        #[source]
        source: ReqwestError,
    },
    #[error("Failed to download {uri}: status {status}")]
    Status { uri: String, status: StatusCode },
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Download of {uri} produced no file at {path}")]
    Missing { uri: String, path: PathBuf },
}

/// Fetches remote code packages.
#[async_trait]
pub trait ArtifactFetcher: Send + Sync {
    /// Downloads `uri` to `destination` and returns the path of the downloaded file.
    async fn fetch(&self, uri: &str, destination: &Path) -> Result<PathBuf, DownloadError>;
}

#[derive(Debug, Clone, Default)]
pub struct HttpArtifactFetcher {
    client: reqwest::Client,
}

impl HttpArtifactFetcher {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ArtifactFetcher for HttpArtifactFetcher {
    async fn fetch(&self, uri: &str, destination: &Path) -> Result<PathBuf, DownloadError> {
        let url = Url::parse(uri).map_err(|source| DownloadError::InvalidUri {
            uri: uri.to_string(),
            source,
        })?;

        let http_error = |source| DownloadError::HttpError {
            uri: uri.to_string(),
            source,
        };
        let write_error = |source| DownloadError::Write {
            path: destination.to_path_buf(),
            source,
        };

        let resp = self.client.get(url).send().await.map_err(http_error)?;

        let status = resp.status();
        if !status.is_success() {
            return Err(DownloadError::Status {
                uri: uri.to_string(),
                status,
            });
        }

        let mut file = tokio::fs::File::create(destination)
            .await
            .map_err(write_error)?;

        let mut stream = resp.bytes_stream();
        let mut written: u64 = 0;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(http_error)?;
            file.write_all(&chunk).await.map_err(write_error)?;
            written += chunk.len() as u64;
        }
        file.flush().await.map_err(write_error)?;

        if !tokio::fs::try_exists(destination).await.unwrap_or(false) {
            return Err(DownloadError::Missing {
                uri: uri.to_string(),
                path: destination.to_path_buf(),
            });
        }

        tracing::info!(%uri, path = %destination.display(), bytes = written, "Downloaded code package.");

        Ok(destination.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_invalid_uri() {
        let dir = tempfile::tempdir().unwrap();
        let result = HttpArtifactFetcher::new()
            .fetch("not a url", &dir.path().join("code.zip"))
            .await;

        assert!(matches!(result, Err(DownloadError::InvalidUri { .. })));
    }
}
