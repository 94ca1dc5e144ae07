use crate::api::auth::Session;
use crate::api::types::{CreatePostRequest, EntityId};
use crate::api::SocialApi;
use anyhow::{Context, Result};
use rand::seq::SliceRandom;
use rand::Rng;

pub struct PostPublisher<'a> {
    api: &'a dyn SocialApi,
    captions: &'a [String],
}

impl<'a> PostPublisher<'a> {
    pub fn new(api: &'a dyn SocialApi, captions: &'a [String]) -> Self {
        Self { api, captions }
    }

    /// Random caption, the uploaded image, no video.
    pub fn build_request<R: Rng + ?Sized>(&self, rng: &mut R, image_url: &str) -> CreatePostRequest {
        let caption = self.captions.choose(rng).cloned().unwrap_or_default();
        CreatePostRequest {
            caption,
            image_url: image_url.to_string(),
            video_url: None,
        }
    }

    /// Submit the post and return the id the server assigned, if reported.
    pub async fn publish(&self, session: &Session, request: &CreatePostRequest) -> Result<Option<EntityId>> {
        tracing::info!(image_url = %request.image_url, caption = %request.caption, "creating post");
        let post_id = self
            .api
            .create_post(session, request)
            .await
            .context("post creation failed")?;

        tracing::info!(
            post_id = %post_id.as_ref().map(|id| id.to_string()).unwrap_or_default(),
            "post created"
        );
        Ok(post_id)
    }
}
