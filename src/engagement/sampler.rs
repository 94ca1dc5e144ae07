use crate::api::auth::Session;
use crate::api::types::Post;
use crate::api::SocialApi;
use anyhow::Result;
use rand::seq::SliceRandom;
use rand::Rng;

/// Drop posts authored by `username`. Posts without an author are kept.
pub fn exclude_own_posts(posts: Vec<Post>, username: &str) -> Vec<Post> {
    posts
        .into_iter()
        .filter(|p| p.author() != Some(username))
        .collect()
}

/// Uniform sample of `min(limit, posts.len())` posts without replacement.
pub fn sample_posts<R: Rng + ?Sized>(rng: &mut R, posts: &[Post], limit: usize) -> Vec<Post> {
    posts.choose_multiple(rng, limit).cloned().collect()
}

/// Fetch one feed page and pick the posts to engage with this cycle.
/// An empty result is a normal outcome: the caller skips the cycle.
pub async fn sample_feed<R: Rng + Send + ?Sized>(
    api: &dyn SocialApi,
    session: &Session,
    rng: &mut R,
    page_size: u32,
    limit: usize,
) -> Result<Vec<Post>> {
    tracing::info!(page_size, limit, "fetching feed");
    let posts = api.fetch_feed(session, 0, page_size).await?;
    if posts.is_empty() {
        tracing::info!("no posts found in feed");
        return Ok(Vec::new());
    }

    let fetched = posts.len();
    let others = exclude_own_posts(posts, session.username());
    if others.is_empty() {
        tracing::info!(fetched, "no posts from other users found");
        return Ok(Vec::new());
    }

    let sample = sample_posts(rng, &others, limit);
    tracing::info!(fetched, eligible = others.len(), sampled = sample.len(), "picked posts to engage with");
    Ok(sample)
}
