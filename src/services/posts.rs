use std::path::Path;

use crate::{
    db::Store,
    error::{AppError, AppResult},
    models::{Favorite, MessageResponse, NewPost, Post, PostId, UserId},
    services::uploads::{self, Attachment},
};

/// Default page size for post listings
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Creates a post, saving its attachment first when one is given
pub async fn create_post(
    store: &dyn Store,
    upload_dir: &Path,
    author_id: UserId,
    title: String,
    content: String,
    attachment: Option<Attachment>,
) -> AppResult<Post> {
    if title.trim().is_empty() {
        return Err(AppError::InvalidInput("Title must not be empty".to_string()));
    }

    let file_path = match attachment {
        Some(attachment) => Some(uploads::save_upload(upload_dir, author_id, &attachment).await?),
        None => None,
    };

    let post = store
        .create_post(NewPost {
            title,
            content,
            file_path,
            author_id,
        })
        .await?;

    tracing::info!(
        post_id = post.id,
        author_id,
        has_attachment = post.file_path.is_some(),
        "Created post"
    );
    Ok(post)
}

pub async fn get_post(store: &dyn Store, post_id: PostId) -> AppResult<Post> {
    store
        .get_post(post_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Post not found".to_string()))
}

pub async fn list_posts(store: &dyn Store, skip: i64, limit: i64) -> AppResult<Vec<Post>> {
    if skip < 0 || limit < 0 {
        return Err(AppError::InvalidInput(
            "skip and limit must not be negative".to_string(),
        ));
    }
    store.list_posts(skip, limit).await
}

pub async fn add_favorite(store: &dyn Store, user_id: UserId, post_id: PostId) -> AppResult<Favorite> {
    let favorite = store.add_favorite(user_id, post_id).await?;
    tracing::info!(user_id, post_id, "Favorited post");
    Ok(favorite)
}

pub async fn remove_favorite(
    store: &dyn Store,
    user_id: UserId,
    post_id: PostId,
) -> AppResult<MessageResponse> {
    store.remove_favorite(user_id, post_id).await?;
    tracing::info!(user_id, post_id, "Removed favorite");
    Ok(MessageResponse::new("Favorite removed successfully"))
}

pub async fn favorite_posts(store: &dyn Store, user_id: UserId) -> AppResult<Vec<Post>> {
    store.favorite_posts(user_id).await
}

pub async fn is_favorited(store: &dyn Store, user_id: UserId, post_id: PostId) -> AppResult<bool> {
    store.is_favorited(user_id, post_id).await
}
