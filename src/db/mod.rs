use std::collections::{HashMap, HashSet};

use crate::{
    error::AppResult,
    models::{Favorite, NewPost, NewUser, Post, PostId, User, UserId},
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::{create_pool, PgStore};

/// Read interface the recommendation core runs against
///
/// A reader is a single consistent view of the favorites relation and the post
/// catalog. Every query made through one reader observes the same data, so a
/// recommendation computed from it cannot mix rows from before and after a
/// concurrent favorite write.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CatalogReader: Send {
    /// Posts the user has favorited
    async fn favorite_post_ids(&mut self, user_id: UserId) -> AppResult<HashSet<PostId>>;

    /// Users who have favorited the post
    async fn favoriting_users(&mut self, post_id: PostId) -> AppResult<HashSet<UserId>>;

    /// Number of favorites the post has received
    async fn count_favorites(&mut self, post_id: PostId) -> AppResult<i64>;

    /// Favorite count for every post in the catalog, zero included
    ///
    /// Default implementation asks `count_favorites` once per post. Backends
    /// with an aggregate query should override it.
    async fn favorite_counts(&mut self) -> AppResult<HashMap<PostId, i64>> {
        let post_ids = self.all_post_ids().await?;
        let mut counts = HashMap::with_capacity(post_ids.len());
        for post_id in post_ids {
            let count = self.count_favorites(post_id).await?;
            counts.insert(post_id, count);
        }
        Ok(counts)
    }

    /// Ids of every post in the catalog, ascending
    async fn all_post_ids(&mut self) -> AppResult<Vec<PostId>>;

    /// Resolves ids to posts in no particular order; unknown ids are skipped
    async fn fetch_posts(&mut self, post_ids: &[PostId]) -> AppResult<Vec<Post>>;
}

/// Persistence for users, posts and favorites
///
/// Shared by all request handlers behind an `Arc<dyn Store>`.
#[async_trait::async_trait]
pub trait Store: Send + Sync {
    /// Inserts a user. Taken usernames or emails are a `Conflict`.
    async fn create_user(&self, user: NewUser) -> AppResult<User>;

    async fn find_user_by_username(&self, username: &str) -> AppResult<Option<User>>;

    async fn create_post(&self, post: NewPost) -> AppResult<Post>;

    async fn get_post(&self, post_id: PostId) -> AppResult<Option<Post>>;

    /// Posts ordered by id
    async fn list_posts(&self, skip: i64, limit: i64) -> AppResult<Vec<Post>>;

    /// Records a favorite
    ///
    /// A missing post is `NotFound`; an existing `(user, post)` pair is a
    /// `Conflict`. Duplicate detection must come from the uniqueness of the pair
    /// in storage, not a prior lookup.
    async fn add_favorite(&self, user_id: UserId, post_id: PostId) -> AppResult<Favorite>;

    /// Deletes a favorite; `NotFound` if the pair does not exist
    async fn remove_favorite(&self, user_id: UserId, post_id: PostId) -> AppResult<()>;

    async fn favorite_posts(&self, user_id: UserId) -> AppResult<Vec<Post>>;

    async fn is_favorited(&self, user_id: UserId, post_id: PostId) -> AppResult<bool>;

    /// Opens a consistent read view for one recommendation request
    async fn read_snapshot(&self) -> AppResult<Box<dyn CatalogReader>>;
}
