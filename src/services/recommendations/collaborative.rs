use std::collections::{BTreeMap, HashMap, HashSet};

use crate::{
    db::CatalogReader,
    error::AppResult,
    models::{Post, PostId, UserId},
};

use super::resolve_posts;

/// Neighborhood of a target user
///
/// Built once per request so that every neighbor's favorites are fetched a
/// single time no matter how many favorites they share with the target.
#[derive(Debug, Default)]
pub struct NeighborIndex {
    /// Each post the target favorited, mapped to the other users who favorited it
    favoriters: BTreeMap<PostId, HashSet<UserId>>,
    /// Each neighbor mapped to everything they favorited
    neighbor_favorites: HashMap<UserId, HashSet<PostId>>,
}

impl NeighborIndex {
    /// Collects the favoriters of `own_favorites` and each of those users' favorites
    pub async fn build(
        reader: &mut dyn CatalogReader,
        user_id: UserId,
        own_favorites: &HashSet<PostId>,
    ) -> AppResult<Self> {
        let mut own: Vec<PostId> = own_favorites.iter().copied().collect();
        own.sort_unstable();

        let mut index = Self::default();

        for post_id in own {
            let mut users = reader.favoriting_users(post_id).await?;
            users.remove(&user_id);

            for &neighbor in &users {
                if !index.neighbor_favorites.contains_key(&neighbor) {
                    let favorites = reader.favorite_post_ids(neighbor).await?;
                    index.neighbor_favorites.insert(neighbor, favorites);
                }
            }

            index.favoriters.insert(post_id, users);
        }

        Ok(index)
    }

    /// Number of distinct neighbors
    pub fn neighbor_count(&self) -> usize {
        self.neighbor_favorites.len()
    }

    /// Co-occurrence score of every post the target has not favorited
    ///
    /// A candidate gains one point per (shared favorite, neighbor) pair that
    /// reaches it, so a neighbor sharing two favorites with the target counts
    /// twice toward each of their other posts.
    pub fn score_candidates(&self, own_favorites: &HashSet<PostId>) -> HashMap<PostId, u32> {
        let mut scores = HashMap::new();

        for neighbors in self.favoriters.values() {
            for neighbor in neighbors {
                let Some(favorites) = self.neighbor_favorites.get(neighbor) else {
                    continue;
                };
                for candidate in favorites.difference(own_favorites) {
                    *scores.entry(*candidate).or_insert(0) += 1;
                }
            }
        }

        scores
    }
}

/// Highest scoring candidates first, equal scores by ascending id
pub fn top_candidates(scores: &HashMap<PostId, u32>, limit: usize) -> Vec<PostId> {
    let mut ranked: Vec<(PostId, u32)> = scores.iter().map(|(id, score)| (*id, *score)).collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    ranked.into_iter().take(limit).map(|(id, _)| id).collect()
}

/// Item-based collaborative filtering
///
/// Recommends posts favorited by users who share at least one favorite with
/// `user_id`, excluding posts `user_id` already favorited. A user with no
/// favorites gets an empty list; the caller decides on any fallback.
///
/// Cost grows with |favorites| x neighbors x neighbor favorites and nothing is
/// cached between requests.
pub async fn collaborative_filter(
    reader: &mut dyn CatalogReader,
    user_id: UserId,
    limit: usize,
) -> AppResult<Vec<Post>> {
    let own_favorites = reader.favorite_post_ids(user_id).await?;
    recommend_from_favorites(reader, user_id, &own_favorites, limit).await
}

/// Collaborative filtering for a user whose favorites are already loaded
pub async fn recommend_from_favorites(
    reader: &mut dyn CatalogReader,
    user_id: UserId,
    own_favorites: &HashSet<PostId>,
    limit: usize,
) -> AppResult<Vec<Post>> {
    if own_favorites.is_empty() {
        return Ok(Vec::new());
    }

    let index = NeighborIndex::build(reader, user_id, own_favorites).await?;
    let scores = index.score_candidates(own_favorites);
    if scores.is_empty() {
        return Ok(Vec::new());
    }

    let top = top_candidates(&scores, limit);

    tracing::debug!(
        user_id,
        favorites = own_favorites.len(),
        neighbors = index.neighbor_count(),
        candidates = scores.len(),
        selected = top.len(),
        "Scored collaborative filtering candidates"
    );

    resolve_posts(reader, &top).await
}
