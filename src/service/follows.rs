use std::time::Duration;

use sqlx::{Pool, Sqlite};

use crate::db::{FollowRepository, Toggle, User, UserRepository};
use crate::error::AppError;
use crate::service::with_deadline;

#[derive(Clone)]
pub struct FollowService {
    db: Pool<Sqlite>,
    deadline: Duration,
}

impl FollowService {
    pub fn new(db: Pool<Sqlite>, deadline: Duration) -> Self {
        Self { db, deadline }
    }

    /// Follow `following_id`, or unfollow when the edge already exists.
    pub async fn toggle(&self, follower_id: i64, following_id: i64) -> Result<Toggle, AppError> {
        if follower_id == following_id {
            return Err(AppError::BadRequest("you cannot follow yourself".to_string()));
        }

        with_deadline(self.deadline, async {
            if !UserRepository::exists(&self.db, following_id).await? {
                return Err(AppError::UserNotFound);
            }

            let outcome = FollowRepository::toggle(&self.db, follower_id, following_id).await?;
            tracing::debug!(follower_id, following_id, ?outcome, "follow toggled");
            Ok(outcome)
        })
        .await
    }

    pub async fn followers(&self, username: &str) -> Result<Vec<User>, AppError> {
        with_deadline(self.deadline, async {
            let user = UserRepository::find_by_username(&self.db, username).await?;
            FollowRepository::followers(&self.db, user.id).await
        })
        .await
    }

    pub async fn followings(&self, username: &str) -> Result<Vec<User>, AppError> {
        with_deadline(self.deadline, async {
            let user = UserRepository::find_by_username(&self.db, username).await?;
            FollowRepository::followings(&self.db, user.id).await
        })
        .await
    }
}
