use super::auth::Session;
use super::types::*;
use super::SocialApi;
use crate::config::{AccountCredentials, ApiConfig};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use std::time::Duration;

/// Statuses the server uses for "done" on write endpoints.
const WRITE_OK: [StatusCode; 2] = [StatusCode::OK, StatusCode::CREATED];

pub struct AppClient {
    client: Client,
    base_url: String,
}

impl AppClient {
    pub fn new(config: &ApiConfig) -> Self {
        let client = Client::builder()
            .pool_max_idle_per_host(4)
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .expect("failed to build HTTP client");
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Authenticated POST with a JSON body.
    async fn post_authed<B: serde::Serialize + ?Sized>(
        &self,
        session: &Session,
        path: &str,
        body: Option<&B>,
    ) -> Result<Response> {
        let mut req = self
            .client
            .post(self.url(path))
            .header(reqwest::header::AUTHORIZATION, session.bearer());
        if let Some(body) = body {
            req = req.json(body);
        }
        req.send()
            .await
            .with_context(|| format!("POST {} failed", path))
    }
}

/// Bail with status and body unless the response status is in `accepted`.
async fn ensure_status(resp: Response, accepted: &[StatusCode], what: &str) -> Result<Response> {
    let status = resp.status();
    if !accepted.contains(&status) {
        let body = resp.text().await.unwrap_or_default();
        anyhow::bail!("{} failed ({}): {}", what, status, body);
    }
    Ok(resp)
}

#[async_trait]
impl SocialApi for AppClient {
    async fn login(&self, credentials: &AccountCredentials) -> Result<Session> {
        let body = LoginRequest {
            username: &credentials.username,
            password: &credentials.password,
        };
        let resp = self
            .client
            .post(self.url("/auth/login"))
            .json(&body)
            .send()
            .await
            .context("login request failed")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("login failed ({}): {}", status, body);
        }

        let parsed: LoginResponse = resp.json().await
            .context("failed to parse login response")?;
        let token = parsed
            .token
            .filter(|t| !t.is_empty())
            .context("no token received in login response")?;

        Ok(Session::new(token, parsed.user_id, &credentials.username))
    }

    async fn fetch_feed(&self, session: &Session, page: u32, limit: u32) -> Result<Vec<Post>> {
        let url = format!("{}/api/dynamic-feeds?page={}&limit={}", self.base_url, page, limit);
        let resp = self
            .client
            .get(&url)
            .header(reqwest::header::AUTHORIZATION, session.bearer())
            .send()
            .await
            .context("GET feed failed")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("GET feed failed ({}): {}", status, body);
        }

        let parsed: FeedResponse = resp.json().await
            .context("failed to parse feed response")?;
        Ok(parsed.posts)
    }

    async fn like_post(&self, session: &Session, post_id: &EntityId) -> Result<()> {
        let path = format!("/api/posts/like/{}", post_id);
        let resp = self.post_authed::<()>(session, &path, None).await?;
        ensure_status(resp, &WRITE_OK, "like").await?;
        Ok(())
    }

    async fn comment_on_post(
        &self,
        session: &Session,
        post_id: &EntityId,
        text: &str,
    ) -> Result<Option<EntityId>> {
        let body = CommentRequest { post_id, comment: text };
        let resp = self.post_authed(session, "/api/comments", Some(&body)).await?;
        let resp = ensure_status(resp, &WRITE_OK, "comment").await?;

        // An unparseable body still means the comment was accepted.
        let parsed: Option<CommentResponse> = resp.json().await.ok();
        Ok(parsed.and_then(|r| r.comment).and_then(|c| c.id))
    }

    async fn request_upload_url(
        &self,
        session: &Session,
        file_name: &str,
        content_type: &str,
    ) -> Result<UploadTicket> {
        let body = UploadUrlRequest { file_name, content_type };
        let resp = self
            .post_authed(session, "/api/presigned/upload/post-image", Some(&body))
            .await?;
        let resp = ensure_status(resp, &[StatusCode::OK], "presigned upload URL").await?;

        let parsed: UploadUrlResponse = resp.json().await
            .context("failed to parse presigned upload response")?;
        let upload_url = parsed
            .upload_url
            .filter(|u| !u.is_empty())
            .context("presigned upload response has no uploadUrl")?;

        Ok(UploadTicket {
            upload_url,
            object_key: parsed.object_key,
        })
    }

    async fn create_post(
        &self,
        session: &Session,
        post: &CreatePostRequest,
    ) -> Result<Option<EntityId>> {
        let resp = self.post_authed(session, "/posts", Some(post)).await?;
        let resp = ensure_status(resp, &WRITE_OK, "create post").await?;

        let parsed: Option<CreatePostResponse> = resp.json().await.ok();
        Ok(parsed.and_then(|r| r.post).and_then(|p| p.id))
    }
}
