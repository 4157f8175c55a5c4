use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    error::AppResult,
    middleware::auth::CurrentUser,
    models::{Favorite, MessageResponse, Post, PostId},
    routes::{
        extract::{Multipart, Path, Query},
        AppState,
    },
    services::{
        posts::{self, DEFAULT_PAGE_SIZE},
        uploads::Attachment,
    },
};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    skip: Option<i64>,
    limit: Option<i64>,
}

/// Reads the `file` part of a multipart field as an attachment
///
/// Browsers send an empty part when no file was picked; that counts as none.
pub(crate) async fn read_attachment(
    field: axum::extract::multipart::Field<'_>,
) -> AppResult<Option<Attachment>> {
    let filename = field.file_name().map(str::to_string).unwrap_or_default();
    let bytes = field.bytes().await?;

    if filename.is_empty() && bytes.is_empty() {
        return Ok(None);
    }

    Ok(Some(Attachment {
        filename,
        bytes: bytes.to_vec(),
    }))
}

/// Handler for post creation (multipart: `title`, `content`, optional `file`)
pub async fn create_post(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Multipart(mut multipart): Multipart,
) -> AppResult<(StatusCode, Json<Post>)> {
    let mut title = String::new();
    let mut content = String::new();
    let mut attachment = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("title") => title = field.text().await?,
            Some("content") => content = field.text().await?,
            Some("file") => attachment = read_attachment(field).await?,
            _ => {}
        }
    }

    let post = posts::create_post(
        state.store.as_ref(),
        &state.upload_dir,
        user.id,
        title,
        content,
        attachment,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(post)))
}

/// Handler for listing posts
pub async fn list_posts(
    State(state): State<AppState>,
    Query(params): Query<ListQuery>,
) -> AppResult<Json<Vec<Post>>> {
    let posts = posts::list_posts(
        state.store.as_ref(),
        params.skip.unwrap_or(0),
        params.limit.unwrap_or(DEFAULT_PAGE_SIZE),
    )
    .await?;
    Ok(Json(posts))
}

/// Handler for a single post
pub async fn get_post(
    State(state): State<AppState>,
    Path(post_id): Path<PostId>,
) -> AppResult<Json<Post>> {
    let post = posts::get_post(state.store.as_ref(), post_id).await?;
    Ok(Json(post))
}

/// Handler for favoriting a post
pub async fn add_favorite(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(post_id): Path<PostId>,
) -> AppResult<(StatusCode, Json<Favorite>)> {
    let favorite = posts::add_favorite(state.store.as_ref(), user.id, post_id).await?;
    Ok((StatusCode::CREATED, Json(favorite)))
}

/// Handler for removing a favorite
pub async fn remove_favorite(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(post_id): Path<PostId>,
) -> AppResult<Json<MessageResponse>> {
    let message = posts::remove_favorite(state.store.as_ref(), user.id, post_id).await?;
    Ok(Json(message))
}

/// Handler reporting whether the current user favorited a post
pub async fn is_favorited(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(post_id): Path<PostId>,
) -> AppResult<Json<Value>> {
    let favorited = posts::is_favorited(state.store.as_ref(), user.id, post_id).await?;
    Ok(Json(json!({ "favorited": favorited })))
}

/// Handler listing the current user's favorites
pub async fn my_favorites(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> AppResult<Json<Vec<Post>>> {
    let posts = posts::favorite_posts(state.store.as_ref(), user.id).await?;
    Ok(Json(posts))
}
