use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod user;

pub use user::{NewUser, TokenResponse, User, UserResponse};

/// Identifier assigned to a post on creation
pub type PostId = i64;

/// Identifier assigned to a user on registration
pub type UserId = i64;

/// A post as stored in the catalog and returned to clients
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
pub struct Post {
    pub id: PostId,
    pub title: String,
    pub content: String,
    /// Relative path of the attachment, e.g. `static/uploads/7_<uuid>.pdf`
    pub file_path: Option<String>,
    pub author_id: UserId,
    pub created_at: DateTime<Utc>,
}

/// Fields required to insert a post
#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub file_path: Option<String>,
    pub author_id: UserId,
}

/// A user's favorite of a post, unique per `(user_id, post_id)`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
pub struct Favorite {
    pub user_id: UserId,
    pub post_id: PostId,
    pub created_at: DateTime<Utc>,
}

/// Result of a standalone file upload
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UploadResponse {
    pub filename: String,
    pub saved_path: String,
    pub message: String,
}

/// Plain acknowledgement body
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
