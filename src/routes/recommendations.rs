use axum::{extract::State, Extension, Json};
use serde::Deserialize;

use crate::{
    error::{AppError, AppResult},
    middleware::{auth::CurrentUser, request_id::RequestId},
    models::Post,
    routes::{extract::Query, AppState},
    services::recommendations,
};

const DEFAULT_LIMIT: usize = 5;

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    #[serde(default = "default_limit")]
    limit: usize,
}

fn default_limit() -> usize {
    DEFAULT_LIMIT
}

/// Accepts `1..=max`
fn validate_limit(limit: usize, max: usize) -> AppResult<usize> {
    if limit == 0 || limit > max {
        return Err(AppError::InvalidInput(format!(
            "limit must be between 1 and {}",
            max
        )));
    }
    Ok(limit)
}

/// Handler for the most favorited posts
pub async fn popular_posts(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Query(params): Query<LimitQuery>,
) -> AppResult<Json<Vec<Post>>> {
    let limit = validate_limit(params.limit, state.max_recommendation_limit)?;

    let mut reader = state.store.read_snapshot().await?;
    let posts = recommendations::popular(reader.as_mut(), limit).await?;

    tracing::info!(
        request_id = %request_id,
        limit,
        returned = posts.len(),
        "Served popular posts"
    );

    Ok(Json(posts))
}

/// Handler for personalized recommendations
pub async fn for_you(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    CurrentUser(user): CurrentUser,
    Query(params): Query<LimitQuery>,
) -> AppResult<Json<Vec<Post>>> {
    let limit = validate_limit(params.limit, state.max_recommendation_limit)?;

    tracing::info!(
        request_id = %request_id,
        user_id = user.id,
        limit,
        "Processing recommendation request"
    );

    let mut reader = state.store.read_snapshot().await?;
    let posts = recommendations::for_you(reader.as_mut(), user.id, limit).await?;

    Ok(Json(posts))
}

/// Handler for random posts
pub async fn random_posts(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Query(params): Query<LimitQuery>,
) -> AppResult<Json<Vec<Post>>> {
    let limit = validate_limit(params.limit, state.max_recommendation_limit)?;

    let mut reader = state.store.read_snapshot().await?;
    let posts = recommendations::random(reader.as_mut(), limit).await?;

    tracing::info!(
        request_id = %request_id,
        limit,
        returned = posts.len(),
        "Served random posts"
    );

    Ok(Json(posts))
}
