use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::{
    db::Store,
    error::{AppError, AppResult},
    models::{MessageResponse, NewUser, TokenResponse, User},
};

/// Access token claims
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Username of the token holder
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

/// HS256 keys and token lifetime, built once at startup
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl JwtKeys {
    pub fn new(secret: &str, ttl_minutes: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::minutes(ttl_minutes),
        }
    }

    /// Issues a signed access token for `username`
    pub fn create_access_token(&self, username: &str) -> AppResult<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: username.to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| AppError::Internal(format!("Token encoding failed: {}", e)))
    }

    /// Returns the token's subject if the signature and expiry check out
    pub fn decode_access_token(&self, token: &str) -> Option<String> {
        match decode::<Claims>(token, &self.decoding, &Validation::default()) {
            Ok(data) => Some(data.claims.sub),
            Err(e) => {
                tracing::debug!(error = %e, "Rejected access token");
                None
            }
        }
    }
}

/// Hashes a password with Argon2id and a random salt
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
}

/// Checks a password against a PHC hash string
pub fn verify_password(password: &str, password_hash: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(password_hash)
        .map_err(|e| AppError::Internal(format!("Invalid password hash format: {}", e)))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(_) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(AppError::Internal(format!(
            "Password verification failed: {}",
            e
        ))),
    }
}

/// Registration payload
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Creates an account
pub async fn register(store: &dyn Store, request: RegisterRequest) -> AppResult<User> {
    let username = request.username.trim();
    let email = request.email.trim();

    if username.is_empty() {
        return Err(AppError::InvalidInput("Username must not be empty".to_string()));
    }
    if !email.contains('@') {
        return Err(AppError::InvalidInput("Invalid email address".to_string()));
    }
    if request.password.is_empty() {
        return Err(AppError::InvalidInput("Password must not be empty".to_string()));
    }

    let hashed_password = hash_password(&request.password)?;
    let user = store
        .create_user(NewUser {
            username: username.to_string(),
            email: email.to_string(),
            hashed_password,
        })
        .await?;

    tracing::info!(user_id = user.id, username = %user.username, "Registered user");
    Ok(user)
}

/// Exchanges credentials for an access token
///
/// Unknown users, inactive users and wrong passwords all produce the same
/// error.
pub async fn login(
    store: &dyn Store,
    keys: &JwtKeys,
    username: &str,
    password: &str,
) -> AppResult<TokenResponse> {
    let rejected = || AppError::Unauthorized("Incorrect username or password".to_string());
    let username = username.trim();

    let Some(user) = store.find_user_by_username(username).await? else {
        tracing::warn!(username = %username, "Login for unknown user");
        return Err(rejected());
    };

    if !user.is_active || !verify_password(password, &user.hashed_password)? {
        tracing::warn!(user_id = user.id, "Login rejected");
        return Err(rejected());
    }

    let token = keys.create_access_token(&user.username)?;
    tracing::info!(user_id = user.id, "Issued access token");
    Ok(TokenResponse::bearer(token))
}

/// Resolves a bearer token to an active user
pub async fn authenticate(store: &dyn Store, keys: &JwtKeys, token: &str) -> AppResult<User> {
    let credentials = || AppError::Unauthorized("Could not validate credentials".to_string());

    let username = keys.decode_access_token(token).ok_or_else(credentials)?;
    let user = store
        .find_user_by_username(&username)
        .await?
        .ok_or_else(credentials)?;

    if !user.is_active {
        return Err(AppError::InvalidInput("Inactive user".to_string()));
    }

    Ok(user)
}

/// Tokens are stateless; the client discards its own copy
pub fn logout() -> MessageResponse {
    MessageResponse::new("Successfully logged out. Please clear your token on the client-side.")
}
