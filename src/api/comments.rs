use axum::extract::State;
use serde::Deserialize;

use crate::api::extract::{AppJson, AppPath};
use crate::api::middleware::AuthUser;
use crate::api::response::{created, done, ok, ApiResponse};
use crate::api::state::AppState;
use crate::api::validation;
use crate::db::Comment;
use crate::error::AppError;

#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    #[serde(default)]
    pub message: String,
}

/// POST /photos/:id/comments
pub async fn create_comment(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(photo_id): AppPath<String>,
    AppJson(req): AppJson<CommentRequest>,
) -> Result<ApiResponse<Comment>, AppError> {
    let message = req.message.trim();
    validation::comment_message(message)?;

    let comment = state.comments.create(&photo_id, user.id, message).await?;
    Ok(created("comment created", comment))
}

/// GET /photos/:id/comments
pub async fn list_comments(
    State(state): State<AppState>,
    AppPath(photo_id): AppPath<String>,
) -> Result<ApiResponse<Vec<Comment>>, AppError> {
    let comments = state.comments.list(&photo_id).await?;
    Ok(ok("comments fetched", comments))
}

/// GET /photos/:id/comments/:comment_id
pub async fn get_comment(
    State(state): State<AppState>,
    AppPath((photo_id, comment_id)): AppPath<(String, i64)>,
) -> Result<ApiResponse<Comment>, AppError> {
    let comment = state.comments.get(&photo_id, comment_id).await?;
    Ok(ok("comment fetched", comment))
}

/// PUT /photos/:id/comments/:comment_id (author only)
pub async fn update_comment(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath((photo_id, comment_id)): AppPath<(String, i64)>,
    AppJson(req): AppJson<CommentRequest>,
) -> Result<ApiResponse<Comment>, AppError> {
    let message = req.message.trim();
    validation::comment_message(message)?;

    let comment = state
        .comments
        .update(&photo_id, comment_id, user.id, message)
        .await?;

    Ok(ok("comment updated", comment))
}

/// DELETE /photos/:id/comments/:comment_id (author only)
pub async fn delete_comment(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath((photo_id, comment_id)): AppPath<(String, i64)>,
) -> Result<ApiResponse<()>, AppError> {
    state.comments.delete(&photo_id, comment_id, user.id).await?;
    Ok(done("comment deleted"))
}
