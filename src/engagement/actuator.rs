//! Per-post engagement: roll which actions to take, then perform them.

use crate::api::auth::Session;
use crate::api::types::Post;
use crate::api::SocialApi;
use rand::seq::SliceRandom;
use rand::Rng;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngagementProbabilities {
    pub like: f64,
    pub comment: f64,
}

impl Default for EngagementProbabilities {
    fn default() -> Self {
        Self { like: 0.7, comment: 0.5 }
    }
}

/// Which actions to take on one post. Drawn independently, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EngagementDecision {
    pub like: bool,
    pub comment: bool,
}

impl EngagementDecision {
    pub fn roll<R: Rng + ?Sized>(rng: &mut R, probs: EngagementProbabilities) -> Self {
        Self {
            like: rng.gen_bool(probs.like),
            comment: rng.gen_bool(probs.comment),
        }
    }

    pub fn is_empty(&self) -> bool {
        !self.like && !self.comment
    }

    pub fn action_count(&self) -> u32 {
        self.like as u32 + self.comment as u32
    }
}

/// Result of engaging with one post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PostOutcome {
    pub attempted: u32,
    pub succeeded: u32,
}

impl PostOutcome {
    /// At least one selected action went through.
    pub fn is_success(&self) -> bool {
        self.succeeded > 0
    }
}

pub struct Actuator<'a> {
    api: &'a dyn SocialApi,
    comments: &'a [String],
    probabilities: EngagementProbabilities,
    action_pause: Duration,
}

impl<'a> Actuator<'a> {
    pub fn new(
        api: &'a dyn SocialApi,
        comments: &'a [String],
        probabilities: EngagementProbabilities,
        action_pause: Duration,
    ) -> Self {
        Self { api, comments, probabilities, action_pause }
    }

    pub async fn engage<R: Rng + Send + ?Sized>(
        &self,
        session: &Session,
        post: &Post,
        rng: &mut R,
    ) -> PostOutcome {
        let decision = EngagementDecision::roll(rng, self.probabilities);
        self.apply(session, post, decision, rng).await
    }

    /// Carry out an already-rolled decision. `rng` picks the comment text.
    pub async fn apply<R: Rng + Send + ?Sized>(
        &self,
        session: &Session,
        post: &Post,
        decision: EngagementDecision,
        rng: &mut R,
    ) -> PostOutcome {
        let Some(post_id) = post.id.as_ref() else {
            tracing::warn!("post has no id, skipping");
            return PostOutcome::default();
        };

        let caption: String = post.caption.as_deref().unwrap_or("No caption").chars().take(50).collect();
        tracing::info!(
            post_id = %post_id,
            author = post.author().unwrap_or("unknown"),
            caption = %caption,
            "engaging with post"
        );

        if decision.is_empty() {
            tracing::info!(post_id = %post_id, "no actions selected for this post");
            return PostOutcome::default();
        }

        let mut outcome = PostOutcome { attempted: decision.action_count(), succeeded: 0 };

        if decision.like {
            match self.api.like_post(session, post_id).await {
                Ok(()) => {
                    tracing::info!(post_id = %post_id, "post liked");
                    outcome.succeeded += 1;
                }
                Err(e) => tracing::warn!(post_id = %post_id, error = %e, "failed to like post"),
            }
            tokio::time::sleep(self.action_pause).await;
        }

        if decision.comment {
            match self.comments.choose(rng) {
                Some(text) => match self.api.comment_on_post(session, post_id, text).await {
                    Ok(comment_id) => {
                        let comment_id = comment_id.map(|c| c.to_string()).unwrap_or_default();
                        tracing::info!(post_id = %post_id, comment_id = %comment_id, text = %text, "comment posted");
                        outcome.succeeded += 1;
                    }
                    Err(e) => tracing::warn!(post_id = %post_id, error = %e, "failed to comment on post"),
                },
                None => tracing::warn!("comment phrase list is empty, skipping comment"),
            }
            tokio::time::sleep(self.action_pause).await;
        }

        tracing::info!(
            post_id = %post_id,
            succeeded = outcome.succeeded,
            attempted = outcome.attempted,
            "post engagement finished"
        );
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_decision_frequencies_converge() {
        let mut rng = StdRng::seed_from_u64(2024);
        let probs = EngagementProbabilities::default();
        let trials = 100_000;
        let (mut likes, mut comments, mut both, mut none) = (0u32, 0u32, 0u32, 0u32);
        for _ in 0..trials {
            let d = EngagementDecision::roll(&mut rng, probs);
            likes += d.like as u32;
            comments += d.comment as u32;
            both += (d.like && d.comment) as u32;
            none += d.is_empty() as u32;
        }
        let freq = |n: u32| n as f64 / trials as f64;
        assert!((freq(likes) - 0.7).abs() < 0.01, "like freq {}", freq(likes));
        assert!((freq(comments) - 0.5).abs() < 0.01, "comment freq {}", freq(comments));
        assert!((freq(both) - 0.35).abs() < 0.01, "joint freq {}", freq(both));
        assert!((freq(none) - 0.15).abs() < 0.01, "none freq {}", freq(none));
    }

    #[test]
    fn test_certain_and_impossible_probabilities() {
        let mut rng = StdRng::seed_from_u64(3);
        let always = EngagementProbabilities { like: 1.0, comment: 1.0 };
        let never = EngagementProbabilities { like: 0.0, comment: 0.0 };
        for _ in 0..100 {
            assert_eq!(EngagementDecision::roll(&mut rng, always).action_count(), 2);
            assert!(EngagementDecision::roll(&mut rng, never).is_empty());
        }
    }

    #[test]
    fn test_outcome_success_needs_one_action() {
        assert!(!PostOutcome { attempted: 2, succeeded: 0 }.is_success());
        assert!(PostOutcome { attempted: 2, succeeded: 1 }.is_success());
        assert!(!PostOutcome::default().is_success());
    }
}
