//! Likes, follows and profiles.

use axum::extract::State;

use crate::api::extract::AppPath;
use crate::api::middleware::AuthUser;
use crate::api::response::{done, ok, ApiResponse};
use crate::api::state::AppState;
use crate::db::{Photo, Toggle, User};
use crate::error::AppError;
use crate::service::UserProfileResponse;

/// POST /photos/:id/likes
pub async fn toggle_like(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(photo_id): AppPath<String>,
) -> Result<ApiResponse<()>, AppError> {
    let message = match state.likes.toggle(&photo_id, user.id).await? {
        Toggle::Added => "successfully liked",
        Toggle::Removed => "successfully unliked",
    };

    Ok(done(message))
}

/// GET /photos/:id/likes
pub async fn photo_likers(
    State(state): State<AppState>,
    AppPath(photo_id): AppPath<String>,
) -> Result<ApiResponse<Vec<User>>, AppError> {
    let users = state.likes.likers(&photo_id).await?;
    Ok(ok("users who liked the photo", users))
}

/// GET /me/liked/photos
pub async fn liked_photos(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<ApiResponse<Vec<Photo>>, AppError> {
    let photos = state.likes.liked_photos(user.id).await?;
    Ok(ok("liked photos", photos))
}

/// POST /users/:user/follows
pub async fn toggle_follow(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(following_id): AppPath<i64>,
) -> Result<ApiResponse<()>, AppError> {
    let message = match state.follows.toggle(user.id, following_id).await? {
        Toggle::Added => "successfully followed",
        Toggle::Removed => "successfully unfollowed",
    };

    Ok(done(message))
}

/// GET /users/:user/followers
pub async fn followers(
    State(state): State<AppState>,
    AppPath(username): AppPath<String>,
) -> Result<ApiResponse<Vec<User>>, AppError> {
    let users = state.follows.followers(&username).await?;
    Ok(ok("followers fetched", users))
}

/// GET /users/:user/followings
pub async fn followings(
    State(state): State<AppState>,
    AppPath(username): AppPath<String>,
) -> Result<ApiResponse<Vec<User>>, AppError> {
    let users = state.follows.followings(&username).await?;
    Ok(ok("followings fetched", users))
}

/// GET /users/profile/:username
pub async fn profile(
    State(state): State<AppState>,
    AppPath(username): AppPath<String>,
) -> Result<ApiResponse<UserProfileResponse>, AppError> {
    let profile = state.profile.profile(&username).await?;
    Ok(ok("profile fetched", profile))
}
