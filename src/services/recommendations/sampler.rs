use std::collections::HashSet;

use rand::{seq::SliceRandom, Rng};

use crate::{
    db::CatalogReader,
    error::AppResult,
    models::{Post, PostId},
};

use super::resolve_posts;

/// Picks `min(limit, candidates.len())` distinct ids uniformly at random
pub fn sample_ids<R: Rng + ?Sized>(candidates: &[PostId], limit: usize, rng: &mut R) -> Vec<PostId> {
    candidates.choose_multiple(rng, limit).copied().collect()
}

/// Random posts from the catalog
///
/// Posts in `excluded` are left out of the draw.
pub async fn random_posts(
    reader: &mut dyn CatalogReader,
    excluded: &HashSet<PostId>,
    limit: usize,
) -> AppResult<Vec<Post>> {
    let mut candidates = reader.all_post_ids().await?;
    candidates.retain(|id| !excluded.contains(id));

    if candidates.is_empty() {
        return Ok(Vec::new());
    }

    let chosen = sample_ids(&candidates, limit, &mut rand::thread_rng());

    tracing::debug!(
        eligible = candidates.len(),
        sampled = chosen.len(),
        "Sampled random posts"
    );

    resolve_posts(reader, &chosen).await
}
