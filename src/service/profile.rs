use std::time::Duration;

use serde::Serialize;
use sqlx::{Pool, Sqlite};

use crate::db::{FollowRepository, Photo, PhotoRepository, UserRepository};
use crate::error::AppError;
use crate::service::with_deadline;

#[derive(Debug, Clone, Serialize)]
pub struct UserProfileResponse {
    pub username: String,
    pub posts_count: i64,
    pub follower: i64,
    pub following: i64,
    pub posts: Vec<Photo>,
}

#[derive(Clone)]
pub struct ProfileService {
    db: Pool<Sqlite>,
    deadline: Duration,
}

impl ProfileService {
    pub fn new(db: Pool<Sqlite>, deadline: Duration) -> Self {
        Self { db, deadline }
    }

    /// Recomputed from the source tables on every call.
    pub async fn profile(&self, username: &str) -> Result<UserProfileResponse, AppError> {
        with_deadline(self.deadline, async {
            let user = UserRepository::find_by_username(&self.db, username).await?;

            let (follower, following, posts_count, posts) = tokio::try_join!(
                FollowRepository::count_followers(&self.db, user.id),
                FollowRepository::count_followings(&self.db, user.id),
                PhotoRepository::count_by_user(&self.db, user.id),
                PhotoRepository::find_by_user(&self.db, user.id),
            )?;

            Ok(UserProfileResponse {
                username: user.username,
                posts_count,
                follower,
                following,
                posts,
            })
        })
        .await
    }
}
