use super::image::TempImage;
use crate::api::auth::Session;
use crate::api::{ObjectStore, SocialApi};
use anyhow::{Context, Result};

/// Public URL for an uploaded image.
///
/// The server serves images at `{base}/images/{name}`, where `name` is the last
/// segment of the storage object key ("posts/abc.jpg" -> "abc.jpg"). A key
/// without a `/`, or no key at all, falls back to the uploaded file name.
pub fn derive_image_url(base_url: &str, object_key: Option<&str>, file_name: &str) -> String {
    let base = base_url.trim_end_matches('/');
    let name = object_key
        .filter(|k| k.contains('/'))
        .and_then(|k| k.rsplit('/').next())
        .filter(|last| !last.is_empty())
        .unwrap_or(file_name);
    format!("{}/images/{}", base, name)
}

/// Two-step upload: ask the server for a presigned URL, then PUT the bytes
/// directly to storage.
pub struct UploadCoordinator<'a> {
    api: &'a dyn SocialApi,
    store: &'a dyn ObjectStore,
    base_url: &'a str,
    content_type: &'a str,
}

impl<'a> UploadCoordinator<'a> {
    pub fn new(
        api: &'a dyn SocialApi,
        store: &'a dyn ObjectStore,
        base_url: &'a str,
        content_type: &'a str,
    ) -> Self {
        Self { api, store, base_url, content_type }
    }

    /// Upload `image` and return the URL it will be served from.
    pub async fn upload(&self, session: &Session, image: &TempImage) -> Result<String> {
        tracing::info!(file = image.file_name(), "requesting presigned upload URL");
        let ticket = self
            .api
            .request_upload_url(session, image.file_name(), self.content_type)
            .await
            .context("presigned URL request failed")?;

        tracing::info!(object_key = ?ticket.object_key, "uploading image to object storage");
        self.store
            .put_file(&ticket.upload_url, image.path(), self.content_type)
            .await
            .context("direct upload failed")?;

        let url = derive_image_url(self.base_url, ticket.object_key.as_deref(), image.file_name());
        tracing::info!(image_url = %url, "image uploaded");
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "http://localhost:8080";

    #[test]
    fn test_last_segment_of_object_key() {
        let url = derive_image_url(BASE, Some("posts/abc.jpg"), "orig.jpg");
        assert_eq!(url, "http://localhost:8080/images/abc.jpg");
        assert!(url.ends_with("/images/abc.jpg"));
    }

    #[test]
    fn test_nested_object_key() {
        assert_eq!(
            derive_image_url(BASE, Some("a/b/c/d.png"), "orig.jpg"),
            "http://localhost:8080/images/d.png"
        );
    }

    #[test]
    fn test_key_without_slash_falls_back() {
        assert_eq!(
            derive_image_url(BASE, Some("abc.jpg"), "orig.jpg"),
            "http://localhost:8080/images/orig.jpg"
        );
    }

    #[test]
    fn test_missing_or_malformed_key_falls_back() {
        assert_eq!(derive_image_url(BASE, None, "orig.jpg"), "http://localhost:8080/images/orig.jpg");
        assert_eq!(
            derive_image_url(BASE, Some("posts/"), "orig.jpg"),
            "http://localhost:8080/images/orig.jpg"
        );
    }

    #[test]
    fn test_trailing_slash_on_base() {
        assert_eq!(
            derive_image_url("http://h/", Some("posts/x.jpg"), "o.jpg"),
            "http://h/images/x.jpg"
        );
    }
}
