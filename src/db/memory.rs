use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;

use crate::{
    db::{CatalogReader, Store},
    error::{AppError, AppResult},
    models::{Favorite, NewPost, NewUser, Post, PostId, User, UserId},
};

/// In-process `Store` used by tests and `STORE_BACKEND=memory`
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<MemoryStoreInner>>,
}

#[derive(Default)]
struct MemoryStoreInner {
    users: BTreeMap<UserId, User>,
    posts: BTreeMap<PostId, Post>,
    favorites: BTreeMap<(UserId, PostId), Favorite>,
    next_user_id: UserId,
    next_post_id: PostId,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes a post and its favorites
    pub async fn delete_post(&self, post_id: PostId) {
        let mut inner = self.inner.write().await;
        inner.posts.remove(&post_id);
        inner.favorites.retain(|(_, p), _| *p != post_id);
    }
}

#[async_trait::async_trait]
impl Store for MemoryStore {
    async fn create_user(&self, user: NewUser) -> AppResult<User> {
        let mut inner = self.inner.write().await;

        if inner.users.values().any(|u| u.username == user.username) {
            return Err(AppError::Conflict("Username already registered".to_string()));
        }
        if inner.users.values().any(|u| u.email == user.email) {
            return Err(AppError::Conflict("Email already registered".to_string()));
        }

        inner.next_user_id += 1;
        let user = User {
            id: inner.next_user_id,
            username: user.username,
            email: user.email,
            hashed_password: user.hashed_password,
            is_active: true,
            created_at: Utc::now(),
        };
        inner.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner.users.values().find(|u| u.username == username).cloned())
    }

    async fn create_post(&self, post: NewPost) -> AppResult<Post> {
        let mut inner = self.inner.write().await;
        inner.next_post_id += 1;
        let post = Post {
            id: inner.next_post_id,
            title: post.title,
            content: post.content,
            file_path: post.file_path,
            author_id: post.author_id,
            created_at: Utc::now(),
        };
        inner.posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn get_post(&self, post_id: PostId) -> AppResult<Option<Post>> {
        let inner = self.inner.read().await;
        Ok(inner.posts.get(&post_id).cloned())
    }

    async fn list_posts(&self, skip: i64, limit: i64) -> AppResult<Vec<Post>> {
        let inner = self.inner.read().await;
        Ok(inner
            .posts
            .values()
            .skip(skip.max(0) as usize)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn add_favorite(&self, user_id: UserId, post_id: PostId) -> AppResult<Favorite> {
        // Check and insert happen under one write lock
        let mut inner = self.inner.write().await;

        if !inner.users.contains_key(&user_id) {
            return Err(AppError::NotFound("User not found".to_string()));
        }
        if !inner.posts.contains_key(&post_id) {
            return Err(AppError::NotFound("Post not found".to_string()));
        }
        if inner.favorites.contains_key(&(user_id, post_id)) {
            return Err(AppError::Conflict("Post already favorited".to_string()));
        }

        let favorite = Favorite {
            user_id,
            post_id,
            created_at: Utc::now(),
        };
        inner.favorites.insert((user_id, post_id), favorite.clone());
        Ok(favorite)
    }

    async fn remove_favorite(&self, user_id: UserId, post_id: PostId) -> AppResult<()> {
        let mut inner = self.inner.write().await;
        inner
            .favorites
            .remove(&(user_id, post_id))
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound("Favorite not found".to_string()))
    }

    async fn favorite_posts(&self, user_id: UserId) -> AppResult<Vec<Post>> {
        let inner = self.inner.read().await;
        let mut favorites: Vec<&Favorite> = inner
            .favorites
            .range((user_id, PostId::MIN)..=(user_id, PostId::MAX))
            .map(|(_, f)| f)
            .collect();
        favorites.sort_by_key(|f| (f.created_at, f.post_id));

        Ok(favorites
            .into_iter()
            .filter_map(|f| inner.posts.get(&f.post_id).cloned())
            .collect())
    }

    async fn is_favorited(&self, user_id: UserId, post_id: PostId) -> AppResult<bool> {
        let inner = self.inner.read().await;
        Ok(inner.favorites.contains_key(&(user_id, post_id)))
    }

    async fn read_snapshot(&self) -> AppResult<Box<dyn CatalogReader>> {
        let inner = self.inner.read().await;
        Ok(Box::new(MemorySnapshot {
            posts: inner.posts.clone(),
            favorites: inner.favorites.keys().copied().collect(),
        }))
    }
}

/// Copy of the catalog taken under the read lock
pub struct MemorySnapshot {
    posts: BTreeMap<PostId, Post>,
    favorites: BTreeSet<(UserId, PostId)>,
}

#[async_trait::async_trait]
impl CatalogReader for MemorySnapshot {
    async fn favorite_post_ids(&mut self, user_id: UserId) -> AppResult<HashSet<PostId>> {
        Ok(self
            .favorites
            .range((user_id, PostId::MIN)..=(user_id, PostId::MAX))
            .map(|(_, post_id)| *post_id)
            .collect())
    }

    async fn favoriting_users(&mut self, post_id: PostId) -> AppResult<HashSet<UserId>> {
        Ok(self
            .favorites
            .iter()
            .filter(|(_, p)| *p == post_id)
            .map(|(user_id, _)| *user_id)
            .collect())
    }

    async fn count_favorites(&mut self, post_id: PostId) -> AppResult<i64> {
        Ok(self.favorites.iter().filter(|(_, p)| *p == post_id).count() as i64)
    }

    async fn favorite_counts(&mut self) -> AppResult<HashMap<PostId, i64>> {
        let mut counts: HashMap<PostId, i64> = self.posts.keys().map(|id| (*id, 0)).collect();
        for (_, post_id) in &self.favorites {
            if let Some(count) = counts.get_mut(post_id) {
                *count += 1;
            }
        }
        Ok(counts)
    }

    async fn all_post_ids(&mut self) -> AppResult<Vec<PostId>> {
        Ok(self.posts.keys().copied().collect())
    }

    async fn fetch_posts(&mut self, post_ids: &[PostId]) -> AppResult<Vec<Post>> {
        Ok(post_ids
            .iter()
            .filter_map(|id| self.posts.get(id).cloned())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(name: &str) -> NewUser {
        NewUser {
            username: name.to_string(),
            email: format!("{}@example.com", name),
            hashed_password: "hash".to_string(),
        }
    }

    fn new_post(author_id: UserId, title: &str) -> NewPost {
        NewPost {
            title: title.to_string(),
            content: "body".to_string(),
            file_path: None,
            author_id,
        }
    }

    #[tokio::test]
    async fn test_duplicate_username_is_conflict() {
        let store = MemoryStore::new();
        store.create_user(new_user("alice")).await.unwrap();

        let mut duplicate = new_user("alice");
        duplicate.email = "other@example.com".to_string();
        let err = store.create_user(duplicate).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(msg) if msg == "Username already registered"));
    }

    #[tokio::test]
    async fn test_duplicate_email_is_conflict() {
        let store = MemoryStore::new();
        store.create_user(new_user("alice")).await.unwrap();

        let mut duplicate = new_user("bob");
        duplicate.email = "alice@example.com".to_string();
        let err = store.create_user(duplicate).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(msg) if msg == "Email already registered"));
    }

    #[tokio::test]
    async fn test_favorite_twice_is_conflict_and_count_stays_one() {
        let store = MemoryStore::new();
        let user = store.create_user(new_user("alice")).await.unwrap();
        let post = store.create_post(new_post(user.id, "P1")).await.unwrap();

        store.add_favorite(user.id, post.id).await.unwrap();
        let err = store.add_favorite(user.id, post.id).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let mut snapshot = store.read_snapshot().await.unwrap();
        assert_eq!(snapshot.count_favorites(post.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_favorite_missing_post_is_not_found() {
        let store = MemoryStore::new();
        let user = store.create_user(new_user("alice")).await.unwrap();
        let err = store.add_favorite(user.id, 42).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(msg) if msg == "Post not found"));
    }

    #[tokio::test]
    async fn test_favorite_by_unknown_user_is_not_found() {
        let store = MemoryStore::new();
        let user = store.create_user(new_user("alice")).await.unwrap();
        let post = store.create_post(new_post(user.id, "P1")).await.unwrap();

        let err = store.add_favorite(user.id + 100, post.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(msg) if msg == "User not found"));
    }

    #[tokio::test]
    async fn test_remove_missing_favorite_is_not_found() {
        let store = MemoryStore::new();
        let user = store.create_user(new_user("alice")).await.unwrap();
        let post = store.create_post(new_post(user.id, "P1")).await.unwrap();

        let err = store.remove_favorite(user.id, post.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(msg) if msg == "Favorite not found"));
    }

    #[tokio::test]
    async fn test_snapshot_ignores_later_writes() {
        let store = MemoryStore::new();
        let user = store.create_user(new_user("alice")).await.unwrap();
        let post = store.create_post(new_post(user.id, "P1")).await.unwrap();

        let mut snapshot = store.read_snapshot().await.unwrap();
        store.add_favorite(user.id, post.id).await.unwrap();

        assert!(snapshot.favorite_post_ids(user.id).await.unwrap().is_empty());
        assert_eq!(snapshot.count_favorites(post.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_favorite_counts_include_unfavorited_posts() {
        let store = MemoryStore::new();
        let user = store.create_user(new_user("alice")).await.unwrap();
        let p1 = store.create_post(new_post(user.id, "P1")).await.unwrap();
        let p2 = store.create_post(new_post(user.id, "P2")).await.unwrap();
        store.add_favorite(user.id, p1.id).await.unwrap();

        let mut snapshot = store.read_snapshot().await.unwrap();
        let counts = snapshot.favorite_counts().await.unwrap();
        assert_eq!(counts.get(&p1.id), Some(&1));
        assert_eq!(counts.get(&p2.id), Some(&0));
    }

    #[tokio::test]
    async fn test_delete_post_drops_its_favorites() {
        let store = MemoryStore::new();
        let user = store.create_user(new_user("alice")).await.unwrap();
        let post = store.create_post(new_post(user.id, "P1")).await.unwrap();
        store.add_favorite(user.id, post.id).await.unwrap();

        store.delete_post(post.id).await;

        assert!(store.get_post(post.id).await.unwrap().is_none());
        assert!(!store.is_favorited(user.id, post.id).await.unwrap());
    }
}
