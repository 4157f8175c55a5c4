use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;

use crate::{
    error::AppResult,
    middleware::auth::CurrentUser,
    models::{MessageResponse, TokenResponse, UserResponse},
    routes::{
        extract::{Form, JsonBody},
        AppState,
    },
    services::auth::{self, RegisterRequest},
};

/// OAuth2 password-flow login form
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// Handler for user registration
pub async fn register(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<RegisterRequest>,
) -> AppResult<(StatusCode, Json<UserResponse>)> {
    let user = auth::register(state.store.as_ref(), request).await?;
    Ok((StatusCode::CREATED, Json(UserResponse::from(&user))))
}

/// Handler for token issuance
pub async fn login(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> AppResult<Json<TokenResponse>> {
    let token = auth::login(state.store.as_ref(), &state.jwt, &form.username, &form.password).await?;
    Ok(Json(token))
}

/// Handler returning the authenticated user
pub async fn me(CurrentUser(user): CurrentUser) -> Json<UserResponse> {
    Json(UserResponse::from(&user))
}

/// Handler for logout
pub async fn logout() -> Json<MessageResponse> {
    Json(auth::logout())
}
