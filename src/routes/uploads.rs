use axum::{extract::State, Json};

use crate::{
    error::{AppError, AppResult},
    middleware::auth::CurrentUser,
    models::UploadResponse,
    routes::{extract::Multipart, posts::read_attachment, AppState},
    services::uploads,
};

/// Handler for a standalone file upload (multipart field `file`)
pub async fn upload(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Multipart(mut multipart): Multipart,
) -> AppResult<Json<UploadResponse>> {
    let mut attachment = None;

    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some("file") {
            attachment = read_attachment(field).await?;
        }
    }

    let attachment =
        attachment.ok_or_else(|| AppError::InvalidInput("A file is required".to_string()))?;

    let response = uploads::upload_file(&state.upload_dir, user.id, attachment).await?;
    Ok(Json(response))
}
