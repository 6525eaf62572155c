use axum::extract::State;
use serde::Deserialize;

use crate::api::extract::{AppJson, AppPath};
use crate::api::middleware::AuthUser;
use crate::api::response::{created, done, ok, ApiResponse};
use crate::api::state::AppState;
use crate::error::AppError;
use crate::service::PhotoResponse;

#[derive(Debug, Deserialize)]
pub struct CreatePhotoRequest {
    #[serde(default)]
    pub caption: String,
    #[serde(default)]
    pub photo_url: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePhotoRequest {
    #[serde(default)]
    pub caption: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// POST /photos
pub async fn create_photo(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(req): AppJson<CreatePhotoRequest>,
) -> Result<ApiResponse<PhotoResponse>, AppError> {
    let photo_url = req.photo_url.trim();
    if photo_url.is_empty() {
        return Err(AppError::BadRequest("photo_url is required".to_string()));
    }

    let photo = state
        .photos
        .create(user.id, req.caption.trim(), photo_url, &req.tags)
        .await?;

    Ok(created("photo created", photo))
}

/// GET /photos
pub async fn list_photos(State(state): State<AppState>) -> Result<ApiResponse<Vec<PhotoResponse>>, AppError> {
    let photos = state.photos.list().await?;
    Ok(ok("photos fetched", photos))
}

/// GET /me/photos
pub async fn my_photos(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<ApiResponse<Vec<PhotoResponse>>, AppError> {
    let photos = state.photos.list_by_user(user.id).await?;
    Ok(ok("photos fetched", photos))
}

/// GET /photos/:id
pub async fn get_photo(
    State(state): State<AppState>,
    AppPath(id): AppPath<String>,
) -> Result<ApiResponse<PhotoResponse>, AppError> {
    let photo = state.photos.get(&id).await?;
    Ok(ok("photo fetched", photo))
}

/// PUT /photos/:id (owner only)
pub async fn update_photo(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(id): AppPath<String>,
    AppJson(req): AppJson<UpdatePhotoRequest>,
) -> Result<ApiResponse<PhotoResponse>, AppError> {
    let photo = state
        .photos
        .update(&id, user.id, req.caption.trim(), &req.tags)
        .await?;

    Ok(ok("photo updated", photo))
}

/// DELETE /photos/:id (owner only)
pub async fn delete_photo(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(id): AppPath<String>,
) -> Result<ApiResponse<()>, AppError> {
    state.photos.delete(&id, user.id).await?;
    Ok(done("photo deleted"))
}
