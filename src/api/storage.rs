use super::ObjectStore;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::path::Path;
use std::time::Duration;

/// Uploads straight to object storage through a presigned URL.
/// The URL itself is the credential, so no bearer token is sent.
pub struct PresignedStore {
    client: Client,
}

impl PresignedStore {
    pub fn new(timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .expect("failed to build HTTP client");
        Self { client }
    }
}

#[async_trait]
impl ObjectStore for PresignedStore {
    async fn put_file(&self, upload_url: &str, path: &Path, content_type: &str) -> Result<()> {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?;
        let size = bytes.len();

        let resp = self
            .client
            .put(upload_url)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await
            .context("upload request failed")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("upload failed ({}): {}", status, body);
        }

        tracing::debug!(bytes = size, "object uploaded");
        Ok(())
    }
}
