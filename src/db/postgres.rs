use std::collections::{HashMap, HashSet};

use sqlx::{migrate::Migrator, postgres::PgPoolOptions, PgPool, Postgres, Transaction};

use crate::{
    db::{CatalogReader, Store},
    error::{AppError, AppResult},
    models::{Favorite, NewPost, NewUser, Post, PostId, User, UserId},
};

/// Embedded schema migrations
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

const POST_COLUMNS: &str = "id, title, content, file_path, author_id, created_at";
const USER_COLUMNS: &str = "id, username, email, hashed_password, is_active, created_at";

/// Creates a PostgreSQL connection pool
///
/// Establishes a pool of database connections for efficient reuse.
/// The pool automatically manages connection lifecycle and limits.
pub async fn create_pool(database_url: &str, max_connections: u32) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;

    Ok(pool)
}

/// `Store` backed by PostgreSQL
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Applies pending migrations
    pub async fn migrate(&self) -> anyhow::Result<()> {
        MIGRATOR.run(&self.pool).await?;
        Ok(())
    }
}

fn registration_error(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            let message = match db_err.constraint() {
                Some("users_email_key") => "Email already registered",
                _ => "Username already registered",
            };
            return AppError::Conflict(message.to_string());
        }
    }
    AppError::Database(e)
}

fn favorite_insert_error(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            return AppError::Conflict("Post already favorited".to_string());
        }
        if db_err.is_foreign_key_violation() {
            return AppError::NotFound(missing_favorite_target(db_err.constraint()).to_string());
        }
    }
    AppError::Database(e)
}

/// Names the side of a favorite whose foreign key was violated
fn missing_favorite_target(constraint: Option<&str>) -> &'static str {
    match constraint {
        Some("user_favorites_user_id_fkey") => "User not found",
        _ => "Post not found",
    }
}

#[async_trait::async_trait]
impl Store for PgStore {
    async fn create_user(&self, user: NewUser) -> AppResult<User> {
        let sql = format!(
            "INSERT INTO users (username, email, hashed_password) VALUES ($1, $2, $3) RETURNING {}",
            USER_COLUMNS
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(&user.username)
            .bind(&user.email)
            .bind(&user.hashed_password)
            .fetch_one(&self.pool)
            .await
            .map_err(registration_error)
    }

    async fn find_user_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE username = $1", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn create_post(&self, post: NewPost) -> AppResult<Post> {
        let sql = format!(
            "INSERT INTO posts (title, content, file_path, author_id) VALUES ($1, $2, $3, $4) RETURNING {}",
            POST_COLUMNS
        );
        let post = sqlx::query_as::<_, Post>(&sql)
            .bind(&post.title)
            .bind(&post.content)
            .bind(&post.file_path)
            .bind(post.author_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(post)
    }

    async fn get_post(&self, post_id: PostId) -> AppResult<Option<Post>> {
        let sql = format!("SELECT {} FROM posts WHERE id = $1", POST_COLUMNS);
        let post = sqlx::query_as::<_, Post>(&sql)
            .bind(post_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(post)
    }

    async fn list_posts(&self, skip: i64, limit: i64) -> AppResult<Vec<Post>> {
        let sql = format!(
            "SELECT {} FROM posts ORDER BY id OFFSET $1 LIMIT $2",
            POST_COLUMNS
        );
        let posts = sqlx::query_as::<_, Post>(&sql)
            .bind(skip)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(posts)
    }

    async fn add_favorite(&self, user_id: UserId, post_id: PostId) -> AppResult<Favorite> {
        sqlx::query_as::<_, Favorite>(
            r#"
            INSERT INTO user_favorites (user_id, post_id)
            VALUES ($1, $2)
            RETURNING user_id, post_id, created_at
            "#,
        )
        .bind(user_id)
        .bind(post_id)
        .fetch_one(&self.pool)
        .await
        .map_err(favorite_insert_error)
    }

    async fn remove_favorite(&self, user_id: UserId, post_id: PostId) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM user_favorites WHERE user_id = $1 AND post_id = $2")
            .bind(user_id)
            .bind(post_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Favorite not found".to_string()));
        }
        Ok(())
    }

    async fn favorite_posts(&self, user_id: UserId) -> AppResult<Vec<Post>> {
        let posts = sqlx::query_as::<_, Post>(
            r#"
            SELECT p.id, p.title, p.content, p.file_path, p.author_id, p.created_at
            FROM posts p
            JOIN user_favorites f ON f.post_id = p.id
            WHERE f.user_id = $1
            ORDER BY f.created_at, p.id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(posts)
    }

    async fn is_favorited(&self, user_id: UserId, post_id: PostId) -> AppResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM user_favorites WHERE user_id = $1 AND post_id = $2)",
        )
        .bind(user_id)
        .bind(post_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn read_snapshot(&self) -> AppResult<Box<dyn CatalogReader>> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await?;
        Ok(Box::new(PgSnapshot { tx }))
    }
}

/// Read-only repeatable-read transaction; rolled back when dropped
pub struct PgSnapshot {
    tx: Transaction<'static, Postgres>,
}

#[async_trait::async_trait]
impl CatalogReader for PgSnapshot {
    async fn favorite_post_ids(&mut self, user_id: UserId) -> AppResult<HashSet<PostId>> {
        let ids = sqlx::query_scalar::<_, i64>("SELECT post_id FROM user_favorites WHERE user_id = $1")
            .bind(user_id)
            .fetch_all(&mut *self.tx)
            .await?;
        Ok(ids.into_iter().collect())
    }

    async fn favoriting_users(&mut self, post_id: PostId) -> AppResult<HashSet<UserId>> {
        let ids = sqlx::query_scalar::<_, i64>("SELECT user_id FROM user_favorites WHERE post_id = $1")
            .bind(post_id)
            .fetch_all(&mut *self.tx)
            .await?;
        Ok(ids.into_iter().collect())
    }

    async fn count_favorites(&mut self, post_id: PostId) -> AppResult<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM user_favorites WHERE post_id = $1")
            .bind(post_id)
            .fetch_one(&mut *self.tx)
            .await?;
        Ok(count)
    }

    async fn favorite_counts(&mut self) -> AppResult<HashMap<PostId, i64>> {
        let rows = sqlx::query_as::<_, (i64, i64)>(
            r#"
            SELECT p.id, COUNT(f.post_id)
            FROM posts p
            LEFT JOIN user_favorites f ON f.post_id = p.id
            GROUP BY p.id
            "#,
        )
        .fetch_all(&mut *self.tx)
        .await?;
        Ok(rows.into_iter().collect())
    }

    async fn all_post_ids(&mut self) -> AppResult<Vec<PostId>> {
        let ids = sqlx::query_scalar::<_, i64>("SELECT id FROM posts ORDER BY id")
            .fetch_all(&mut *self.tx)
            .await?;
        Ok(ids)
    }

    async fn fetch_posts(&mut self, post_ids: &[PostId]) -> AppResult<Vec<Post>> {
        if post_ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!("SELECT {} FROM posts WHERE id = ANY($1)", POST_COLUMNS);
        let posts = sqlx::query_as::<_, Post>(&sql)
            .bind(post_ids)
            .fetch_all(&mut *self.tx)
            .await?;
        Ok(posts)
    }
}
