pub mod actuator;
pub mod sampler;

use crate::api::auth::Session;
use crate::api::SocialApi;
use crate::config::{EngagementConfig, RotationFailurePolicy};
use crate::scheduler::{Controller, CycleReport};
use actuator::{Actuator, EngagementProbabilities};
use anyhow::{Context, Result};
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Logs in from a pool of accounts and likes/comments on other users' posts.
pub struct EngagementController {
    api: Arc<dyn SocialApi>,
    config: EngagementConfig,
    rng: StdRng,
    session: Session,
    cancel: CancellationToken,
}

impl EngagementController {
    /// Log in as a random pooled account. Failure here is fatal for the run.
    pub async fn start(api: Arc<dyn SocialApi>, config: EngagementConfig, mut rng: StdRng) -> Result<Self> {
        let session = login_random(api.as_ref(), &config, &mut rng)
            .await
            .context("cannot start without a successful login")?;
        Ok(Self { api, config, rng, session, cancel: CancellationToken::new() })
    }

    /// Leave the rest of a cycle's sample untouched once `cancel` fires.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// One engagement cycle. Returns the number of posts engaged successfully.
    pub async fn run_engagement_cycle(&mut self) -> u64 {
        let sample = match sampler::sample_feed(
            self.api.as_ref(),
            &self.session,
            &mut self.rng,
            self.config.feed_page_size,
            self.config.sample_limit,
        )
        .await
        {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(error = %e, "failed to fetch posts");
                Vec::new()
            }
        };

        if sample.is_empty() {
            tracing::info!("no posts to engage with, skipping cycle");
            return 0;
        }

        let actuator = Actuator::new(
            self.api.as_ref(),
            &self.config.comments,
            EngagementProbabilities {
                like: self.config.like_probability,
                comment: self.config.comment_probability,
            },
            Duration::from_millis(self.config.action_pause_ms),
        );

        let mut successful = 0u64;
        for (done, post) in sample.iter().enumerate() {
            if self.cancel.is_cancelled() {
                tracing::info!(skipped = sample.len() - done, "cancelled, leaving remaining posts");
                break;
            }
            if actuator.engage(&self.session, post, &mut self.rng).await.is_success() {
                successful += 1;
            }

            let delay_ms = self
                .rng
                .gen_range(self.config.post_delay_min_ms..=self.config.post_delay_max_ms);
            tracing::debug!(delay_ms, "waiting before next post");
            tokio::select! {
                _ = tokio::time::sleep(Duration::from_millis(delay_ms)) => {}
                _ = self.cancel.cancelled() => {
                    tracing::info!(skipped = sample.len() - done - 1, "cancelled during post delay");
                    break;
                }
            }
        }

        tracing::info!(successful, sampled = sample.len(), "engagement cycle completed");
        successful
    }

    /// Re-login, possibly as a different pooled account. On failure the
    /// configured policy decides between keeping the old session and stopping.
    pub async fn rotate_account(&mut self) -> Result<()> {
        tracing::info!(current = self.session.username(), "switching bot account");
        match login_random(self.api.as_ref(), &self.config, &mut self.rng).await {
            Ok(session) => {
                self.session = session;
                Ok(())
            }
            Err(e) => match self.config.on_rotation_failure {
                RotationFailurePolicy::Continue => {
                    tracing::warn!(
                        error = %e,
                        account = self.session.username(),
                        "failed to switch accounts, continuing with current session"
                    );
                    Ok(())
                }
                RotationFailurePolicy::Abort => Err(e.context("account rotation failed")),
            },
        }
    }
}

async fn login_random(api: &dyn SocialApi, config: &EngagementConfig, rng: &mut StdRng) -> Result<Session> {
    let account = config
        .accounts
        .choose(rng)
        .context("no engagement accounts configured")?;
    tracing::info!(username = %account.username, "logging in");
    let session = api.login(account).await?;
    tracing::info!(
        username = session.username(),
        user_id = %session.user_id().map(|u| u.to_string()).unwrap_or_default(),
        token_preview = session.token_preview(),
        "login successful"
    );
    Ok(session)
}

#[async_trait]
impl Controller for EngagementController {
    fn name(&self) -> &'static str {
        "engagement bot"
    }

    fn success_label(&self) -> &'static str {
        "engagements"
    }

    async fn run_cycle(&mut self, cycle: u64) -> Result<CycleReport> {
        let successes = self.run_engagement_cycle().await;
        let report = CycleReport::new(successes, Duration::from_secs(self.config.cycle_interval_s));
        if cycle % self.config.rotate_every.max(1) == 0 {
            if let Err(e) = self.rotate_account().await {
                return Ok(report.halted(format!("{:#}", e)));
            }
        }
        Ok(report)
    }
}
