use std::collections::HashMap;

use crate::{
    db::CatalogReader,
    error::AppResult,
    models::{Post, PostId},
};

use super::resolve_posts;

/// Orders post ids by favorite count, most favorited first
///
/// Equal counts fall back to ascending post id so repeated calls over the same
/// data return the same order.
pub fn rank_by_favorites(counts: &HashMap<PostId, i64>, limit: usize) -> Vec<PostId> {
    let mut ranked: Vec<(PostId, i64)> = counts.iter().map(|(id, count)| (*id, *count)).collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    ranked.into_iter().take(limit).map(|(id, _)| id).collect()
}

/// Up to `limit` posts ranked by favorite count; unfavorited posts rank last
pub async fn most_popular(reader: &mut dyn CatalogReader, limit: usize) -> AppResult<Vec<Post>> {
    let counts = reader.favorite_counts().await?;
    let ranked = rank_by_favorites(&counts, limit);

    tracing::debug!(
        catalog_size = counts.len(),
        ranked = ranked.len(),
        "Ranked posts by favorites"
    );

    resolve_posts(reader, &ranked).await
}
