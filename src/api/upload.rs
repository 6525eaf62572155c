use axum::extract::State;
use serde::Serialize;

use crate::api::extract::AppMultipart;
use crate::api::middleware::AuthUser;
use crate::api::response::{created, ApiResponse};
use crate::api::state::AppState;
use crate::error::AppError;

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub url: String,
}

/// POST /files/upload, multipart with a `file` field
pub async fn upload_file(
    State(state): State<AppState>,
    user: AuthUser,
    AppMultipart(mut form): AppMultipart,
) -> Result<ApiResponse<UploadResponse>, AppError> {
    while let Some(field) = form.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }

        let data = field.bytes().await?.to_vec();
        let url = state.upload.upload(user.id, data).await?;

        return Ok(created("file uploaded", UploadResponse { url }));
    }

    Err(AppError::BadRequest("missing file".to_string()))
}
