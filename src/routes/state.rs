use std::path::PathBuf;
use std::sync::Arc;

use crate::{config::Config, db::Store, services::auth::JwtKeys};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub jwt: Arc<JwtKeys>,
    /// Where attachments are written and served from
    pub upload_dir: PathBuf,
    /// Largest `limit` accepted by the recommendation endpoints
    pub max_recommendation_limit: usize,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, config: &Config) -> Self {
        Self {
            store,
            jwt: Arc::new(JwtKeys::new(
                &config.jwt_secret,
                config.access_token_expire_minutes,
            )),
            upload_dir: PathBuf::from(&config.upload_dir),
            max_recommendation_limit: config.max_recommendation_limit,
        }
    }
}
