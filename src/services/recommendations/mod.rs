//! Post recommendations
//!
//! Three read-only entry points are exposed: `popular`, `for_you` and
//! `random`. Each runs against one `CatalogReader` so all queries behind a
//! single recommendation see the same data.

use std::collections::{HashMap, HashSet};

use crate::{
    db::CatalogReader,
    error::AppResult,
    models::{Post, PostId, UserId},
};

pub mod collaborative;
pub mod popularity;
pub mod sampler;

pub use collaborative::{collaborative_filter, recommend_from_favorites};
pub use popularity::most_popular;
pub use sampler::random_posts;

/// Extra popular posts fetched to survive filtering when topping up
pub const SUPPLEMENT_OVERFETCH: usize = 5;

/// Resolves ids to posts, keeping the order of `post_ids`
///
/// Ids that no longer resolve are dropped.
pub(crate) async fn resolve_posts(
    reader: &mut dyn CatalogReader,
    post_ids: &[PostId],
) -> AppResult<Vec<Post>> {
    if post_ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut by_id: HashMap<PostId, Post> = reader
        .fetch_posts(post_ids)
        .await?
        .into_iter()
        .map(|post| (post.id, post))
        .collect();

    Ok(post_ids.iter().filter_map(|id| by_id.remove(id)).collect())
}

/// Most favorited posts
pub async fn popular(reader: &mut dyn CatalogReader, limit: usize) -> AppResult<Vec<Post>> {
    most_popular(reader, limit).await
}

/// Uniformly random posts
pub async fn random(reader: &mut dyn CatalogReader, limit: usize) -> AppResult<Vec<Post>> {
    random_posts(reader, &HashSet::new(), limit).await
}

/// Personalized recommendations for `user_id`
///
/// Collaborative filtering first. A short result is topped up from the
/// popularity ranking, skipping posts already included or favorited by the
/// user. Only when both stages produce nothing is the list replaced by a
/// random sample; a short but non-empty list is returned as it is.
pub async fn for_you(
    reader: &mut dyn CatalogReader,
    user_id: UserId,
    limit: usize,
) -> AppResult<Vec<Post>> {
    let favorited = reader.favorite_post_ids(user_id).await?;

    let mut recommendations = recommend_from_favorites(reader, user_id, &favorited, limit).await?;
    let collaborative_count = recommendations.len();

    if recommendations.len() < limit {
        let needed = limit - recommendations.len();
        let candidates = most_popular(reader, limit + SUPPLEMENT_OVERFETCH).await?;
        let included: HashSet<PostId> = recommendations.iter().map(|post| post.id).collect();

        let supplement: Vec<Post> = candidates
            .into_iter()
            .filter(|post| !included.contains(&post.id) && !favorited.contains(&post.id))
            .take(needed)
            .collect();

        recommendations.extend(supplement);
    }

    let supplemented_count = recommendations.len() - collaborative_count;

    let mut sampled = false;
    if recommendations.is_empty() {
        recommendations = random_posts(reader, &favorited, limit).await?;
        sampled = true;
    }

    recommendations.truncate(limit);

    tracing::info!(
        user_id,
        limit,
        collaborative = collaborative_count,
        supplemented = supplemented_count,
        sampled,
        returned = recommendations.len(),
        "Built recommendations"
    );

    Ok(recommendations)
}
