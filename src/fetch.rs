//! Remote artifact fetcher: streams bytes from a URL to a local path with
//! progress reporting. Single attempt, no retry/backoff; callers decide
//! remediation.

use crate::error::FetchError;
use crate::progress::ProgressReporter;
use async_trait::async_trait;
use futures::StreamExt;
use sha2::{Digest, Sha256};
use std::path::Path;
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Download seam for the workflow. Mocked in tests.
#[async_trait]
pub trait ArtifactFetcher: Send + Sync {
    /// Stream `url` into `dest`, reporting (bytes_read, total_bytes) as the
    /// transfer progresses. When the total size is unknown the raw byte count
    /// is reported instead of a percentage.
    async fn fetch(
        &self,
        url: &str,
        dest: &Path,
        reporter: &dyn ProgressReporter,
    ) -> Result<(), FetchError>;

    /// Fetch and verify against an expected SHA-256 hex digest. When no
    /// digest is given this is a plain fetch.
    async fn fetch_verified(
        &self,
        url: &str,
        dest: &Path,
        expected_sha256: Option<&str>,
        reporter: &dyn ProgressReporter,
    ) -> Result<(), FetchError>;
}

/// HTTP fetcher backed by reqwest.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ArtifactFetcher for HttpFetcher {
    async fn fetch(
        &self,
        url: &str,
        dest: &Path,
        reporter: &dyn ProgressReporter,
    ) -> Result<(), FetchError> {
        self.fetch_verified(url, dest, None, reporter).await
    }

    async fn fetch_verified(
        &self,
        url: &str,
        dest: &Path,
        expected_sha256: Option<&str>,
        reporter: &dyn ProgressReporter,
    ) -> Result<(), FetchError> {
        tracing::info!("[Fetcher] Downloading {}", url);

        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(FetchError::Status(response.status()));
        }

        let total_bytes = response.content_length();
        let mut file = fs::File::create(dest).await?;
        let mut hasher = expected_sha256.map(|_| Sha256::new());
        let mut bytes_read: u64 = 0;

        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            if let Some(hasher) = hasher.as_mut() {
                hasher.update(&chunk);
            }
            file.write_all(&chunk).await?;
            bytes_read += chunk.len() as u64;
            reporter.emit_bytes(bytes_read, total_bytes);
        }

        file.sync_all().await?;

        if let (Some(hasher), Some(expected)) = (hasher, expected_sha256) {
            let actual = hex::encode(hasher.finalize());
            if !actual.eq_ignore_ascii_case(expected) {
                return Err(FetchError::ChecksumMismatch {
                    expected: expected.to_string(),
                    actual,
                });
            }
        }

        tracing::info!(
            "[Fetcher] Download completed to {} ({} bytes)",
            dest.display(),
            bytes_read
        );
        Ok(())
    }
}
