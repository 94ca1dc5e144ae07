//! Stock photo download into a self-cleaning temp file.

use anyhow::{Context, Result};
use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWriteExt;

/// A downloaded image on local disk. The file is removed exactly once:
/// by [`TempImage::cleanup`], or on drop if the cycle bailed out early.
#[derive(Debug)]
pub struct TempImage {
    path: PathBuf,
    file_name: String,
    removed: bool,
}

impl TempImage {
    /// Claim `temp_{file_name}` inside `dir`. Nothing is written yet.
    pub fn new(dir: &Path, file_name: String) -> Self {
        Self {
            path: dir.join(format!("temp_{}", file_name)),
            file_name,
            removed: false,
        }
    }

    /// `random_image_{unix_ts}.jpg`
    pub fn timestamped(dir: &Path) -> Self {
        let ts = chrono::Utc::now().timestamp();
        Self::new(dir, format!("random_image_{}.jpg", ts))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Name the image is uploaded under.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn cleanup(mut self) -> Result<()> {
        self.remove()
    }

    fn remove(&mut self) -> Result<()> {
        if self.removed {
            return Ok(());
        }
        self.removed = true;
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::info!(path = %self.path.display(), "cleaned up temporary file");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("could not remove temp file {}", self.path.display())),
        }
    }
}

impl Drop for TempImage {
    fn drop(&mut self) {
        if let Err(e) = self.remove() {
            tracing::warn!(error = %e, "temp file cleanup failed");
        }
    }
}

/// Where stock photos come from.
#[async_trait]
pub trait ImageSource: Send + Sync {
    /// Download one image into `dir`. On error no file is left behind.
    async fn download(&self, random_id: u32, dir: &Path) -> Result<TempImage>;
}

/// Random photos from a picsum-style provider: `{base}/{width}/{height}?random={id}`.
pub struct PicsumSource {
    client: Client,
    base_url: String,
    width: u32,
    height: u32,
}

impl PicsumSource {
    pub fn new(base_url: &str, width: u32, height: u32, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .expect("failed to build HTTP client");
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            width,
            height,
        }
    }

    pub fn image_url(&self, random_id: u32) -> String {
        format!("{}/{}/{}?random={}", self.base_url, self.width, self.height, random_id)
    }
}

#[async_trait]
impl ImageSource for PicsumSource {
    async fn download(&self, random_id: u32, dir: &Path) -> Result<TempImage> {
        let url = self.image_url(random_id);
        tracing::info!(random_id, "downloading random image");

        let resp = self.client.get(&url).send().await
            .context("image request failed")?;
        let status = resp.status();
        if !status.is_success() {
            anyhow::bail!("image download failed ({})", status);
        }

        // From here on the guard owns the path; any early return removes it.
        let image = TempImage::timestamped(dir);
        let mut file = tokio::fs::File::create(image.path())
            .await
            .with_context(|| format!("failed to create {}", image.path().display()))?;

        let mut written = 0usize;
        let mut stream = resp.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.context("image stream interrupted")?;
            file.write_all(&chunk).await.context("failed to write image chunk")?;
            written += chunk.len();
        }
        file.flush().await.context("failed to flush image file")?;

        tracing::info!(file = image.file_name(), bytes = written, "image downloaded");
        Ok(image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temp_image_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let path = {
            let image = TempImage::new(dir.path(), "a.jpg".to_string());
            std::fs::write(image.path(), b"data").unwrap();
            assert!(image.path().exists());
            image.path().to_path_buf()
        };
        assert!(!path.exists());
    }

    #[test]
    fn test_cleanup_removes_once() {
        let dir = tempfile::tempdir().unwrap();
        let image = TempImage::new(dir.path(), "b.jpg".to_string());
        std::fs::write(image.path(), b"data").unwrap();
        let path = image.path().to_path_buf();
        image.cleanup().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_cleanup_of_never_written_file_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let image = TempImage::new(dir.path(), "c.jpg".to_string());
        assert!(image.cleanup().is_ok());
    }

    #[test]
    fn test_naming() {
        let image = TempImage::new(Path::new("/tmp/x"), "random_image_1.jpg".to_string());
        assert_eq!(image.file_name(), "random_image_1.jpg");
        assert_eq!(image.path(), Path::new("/tmp/x/temp_random_image_1.jpg"));

        let stamped = TempImage::timestamped(Path::new("/nonexistent"));
        assert!(stamped.file_name().starts_with("random_image_"));
        assert!(stamped.file_name().ends_with(".jpg"));
    }

    #[test]
    fn test_picsum_url() {
        let src = PicsumSource::new("https://picsum.photos/", 800, 600, Duration::from_secs(5));
        assert_eq!(src.image_url(42), "https://picsum.photos/800/600?random=42");
    }
}
