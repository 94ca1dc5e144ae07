pub mod auth;
pub mod rest;
pub mod storage;
pub mod types;

use crate::config::AccountCredentials;
use anyhow::Result;
use async_trait::async_trait;
use auth::Session;
use std::path::Path;
use types::{CreatePostRequest, EntityId, Post, UploadTicket};

/// The application server the controllers talk to.
#[async_trait]
pub trait SocialApi: Send + Sync {
    async fn login(&self, credentials: &AccountCredentials) -> Result<Session>;
    async fn fetch_feed(&self, session: &Session, page: u32, limit: u32) -> Result<Vec<Post>>;
    async fn like_post(&self, session: &Session, post_id: &EntityId) -> Result<()>;
    /// Returns the new comment's id when the server reports one.
    async fn comment_on_post(
        &self,
        session: &Session,
        post_id: &EntityId,
        text: &str,
    ) -> Result<Option<EntityId>>;
    async fn request_upload_url(
        &self,
        session: &Session,
        file_name: &str,
        content_type: &str,
    ) -> Result<UploadTicket>;
    /// Returns the new post's id when the server reports one.
    async fn create_post(
        &self,
        session: &Session,
        post: &CreatePostRequest,
    ) -> Result<Option<EntityId>>;
}

/// Direct-to-storage write through a presigned URL.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put_file(&self, upload_url: &str, path: &Path, content_type: &str) -> Result<()>;
}
