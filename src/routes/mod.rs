use axum::{
    extract::DefaultBodyLimit,
    http::StatusCode,
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::{
    middleware::request_id::{make_span_with_request_id, request_id_middleware},
    services::uploads::MAX_UPLOAD_BYTES,
};

pub mod auth;
pub mod extract;
pub mod posts;
pub mod recommendations;
pub mod state;
pub mod uploads;

pub use state::AppState;

/// Creates the application router with all routes
pub fn create_router(state: AppState) -> Router {
    let upload_dir = state.upload_dir.clone();

    Router::new()
        .route("/health", get(health_check))
        .nest("/auth", auth_routes())
        .merge(post_routes())
        .nest("/recommendations", recommendation_routes())
        .route(
            "/uploads",
            post(uploads::upload).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .nest_service("/static/uploads", ServeDir::new(upload_dir))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(CorsLayer::permissive())
                .layer(middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id)),
        )
}

/// Account routes under /auth
fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/token", post(auth::login))
        .route("/me", get(auth::me))
        .route("/logout", post(auth::logout))
}

/// Post and favorite routes
fn post_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/posts",
            get(posts::list_posts)
                .post(posts::create_post)
                .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/posts/:id", get(posts::get_post))
        .route(
            "/posts/:id/favorite",
            post(posts::add_favorite).delete(posts::remove_favorite),
        )
        .route("/posts/:id/favorited", get(posts::is_favorited))
        .route("/users/me/favorites", get(posts::my_favorites))
}

/// Recommendation routes under /recommendations
fn recommendation_routes() -> Router<AppState> {
    Router::new()
        .route("/popular-posts", get(recommendations::popular_posts))
        .route("/for-you", get(recommendations::for_you))
        .route("/random-posts", get(recommendations::random_posts))
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}
