pub mod image;
pub mod publisher;
pub mod upload;

use crate::api::auth::Session;
use crate::api::{ObjectStore, SocialApi};
use crate::config::PostingConfig;
use crate::scheduler::{Controller, CycleReport};
use anyhow::{Context, Result};
use async_trait::async_trait;
use image::{ImageSource, TempImage};
use publisher::PostPublisher;
use rand::rngs::StdRng;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use upload::UploadCoordinator;

/// How a single post-creation cycle ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostCycleOutcome {
    Published,
    /// Image could not be fetched; nothing was uploaded or published.
    DownloadFailed,
    /// Image fetched but upload or publish failed.
    Failed,
}

/// Logs in as one fixed account and periodically publishes a stock photo.
pub struct PostController {
    api: Arc<dyn SocialApi>,
    store: Arc<dyn ObjectStore>,
    images: Arc<dyn ImageSource>,
    config: PostingConfig,
    base_url: String,
    rng: StdRng,
    session: Session,
}

impl PostController {
    /// Log in as the posting account. Failure here is fatal for the run.
    pub async fn start(
        api: Arc<dyn SocialApi>,
        store: Arc<dyn ObjectStore>,
        images: Arc<dyn ImageSource>,
        config: PostingConfig,
        base_url: &str,
        rng: StdRng,
    ) -> Result<Self> {
        tracing::info!(username = %config.account.username, "logging in");
        let session = api
            .login(&config.account)
            .await
            .context("cannot start without a successful login")?;
        tracing::info!(
            username = session.username(),
            user_id = %session.user_id().map(|u| u.to_string()).unwrap_or_default(),
            "login successful"
        );
        Ok(Self {
            api,
            store,
            images,
            config,
            base_url: base_url.to_string(),
            rng,
            session,
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Download, upload, publish, clean up.
    pub async fn run_post_cycle(&mut self) -> PostCycleOutcome {
        let random_id = self.rng.gen_range(1..=1000);
        let image = match self.images.download(random_id, &self.config.temp_dir).await {
            Ok(image) => image,
            Err(e) => {
                tracing::warn!(error = %format!("{:#}", e), "image download failed, skipping this cycle");
                return PostCycleOutcome::DownloadFailed;
            }
        };

        let outcome = match self.publish(&image).await {
            Ok(()) => PostCycleOutcome::Published,
            Err(e) => {
                tracing::warn!(error = %format!("{:#}", e), "post creation failed, will retry next cycle");
                PostCycleOutcome::Failed
            }
        };

        if let Err(e) = image.cleanup() {
            tracing::warn!(error = %e, "could not remove temp file");
        }
        outcome
    }

    async fn publish(&mut self, image: &TempImage) -> Result<()> {
        let uploader = UploadCoordinator::new(
            self.api.as_ref(),
            self.store.as_ref(),
            &self.base_url,
            &self.config.content_type,
        );
        let image_url = uploader.upload(&self.session, image).await?;

        let publisher = PostPublisher::new(self.api.as_ref(), &self.config.captions);
        let request = publisher.build_request(&mut self.rng, &image_url);
        publisher.publish(&self.session, &request).await?;
        Ok(())
    }
}

#[async_trait]
impl Controller for PostController {
    fn name(&self) -> &'static str {
        "post bot"
    }

    fn success_label(&self) -> &'static str {
        "posts created"
    }

    async fn run_cycle(&mut self, _cycle: u64) -> Result<CycleReport> {
        let interval = Duration::from_secs(self.config.interval_s);
        let report = match self.run_post_cycle().await {
            PostCycleOutcome::Published => CycleReport::new(1, interval),
            PostCycleOutcome::Failed => CycleReport::new(0, interval),
            PostCycleOutcome::DownloadFailed => {
                CycleReport::new(0, Duration::from_secs(self.config.download_backoff_s))
            }
        };
        Ok(report)
    }
}
