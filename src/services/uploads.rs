use std::path::Path;

use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{UploadResponse, UserId},
};

/// URL prefix under which saved uploads are served
pub const UPLOAD_URL_PREFIX: &str = "static/uploads";

/// Largest accepted request body on upload routes
pub const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// File sent with a multipart request
#[derive(Debug, Clone)]
pub struct Attachment {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Name an upload is stored under: `<user_id>_<uuid><.ext>`
///
/// Only a short alphanumeric extension survives from the client's filename.
pub fn stored_filename(user_id: UserId, original_filename: &str) -> String {
    let extension = Path::new(original_filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.len() <= 16)
        .filter(|ext| ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
        .unwrap_or_default();

    format!("{}_{}{}", user_id, Uuid::new_v4(), extension)
}

/// Writes an attachment to `upload_dir` and returns its public relative path
pub async fn save_upload(
    upload_dir: &Path,
    user_id: UserId,
    attachment: &Attachment,
) -> AppResult<String> {
    tokio::fs::create_dir_all(upload_dir).await?;

    let name = stored_filename(user_id, &attachment.filename);
    tokio::fs::write(upload_dir.join(&name), &attachment.bytes).await?;

    tracing::info!(
        user_id,
        original = %attachment.filename,
        stored = %name,
        bytes = attachment.bytes.len(),
        "Saved upload"
    );

    Ok(format!("{}/{}", UPLOAD_URL_PREFIX, name))
}

/// Standalone upload not attached to a post
pub async fn upload_file(
    upload_dir: &Path,
    user_id: UserId,
    attachment: Attachment,
) -> AppResult<UploadResponse> {
    let saved_path = save_upload(upload_dir, user_id, &attachment).await?;
    Ok(UploadResponse {
        filename: attachment.filename,
        saved_path,
        message: "File uploaded successfully".to_string(),
    })
}
