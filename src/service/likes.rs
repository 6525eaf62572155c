use std::time::Duration;

use sqlx::{Pool, Sqlite};

use crate::db::{LikeRepository, Photo, PhotoRepository, Toggle, User, UserRepository};
use crate::error::AppError;
use crate::service::with_deadline;

#[derive(Clone)]
pub struct LikeService {
    db: Pool<Sqlite>,
    deadline: Duration,
}

impl LikeService {
    pub fn new(db: Pool<Sqlite>, deadline: Duration) -> Self {
        Self { db, deadline }
    }

    /// Like the photo, or unlike it when the like already exists.
    pub async fn toggle(&self, photo_id: &str, user_id: i64) -> Result<Toggle, AppError> {
        with_deadline(self.deadline, async {
            if !PhotoRepository::exists(&self.db, photo_id).await? {
                return Err(AppError::PhotoNotFound);
            }

            let outcome = LikeRepository::toggle(&self.db, user_id, photo_id).await?;
            tracing::debug!(photo_id, user_id, ?outcome, "like toggled");
            Ok(outcome)
        })
        .await
    }

    pub async fn likers(&self, photo_id: &str) -> Result<Vec<User>, AppError> {
        with_deadline(self.deadline, async {
            if !PhotoRepository::exists(&self.db, photo_id).await? {
                return Err(AppError::PhotoNotFound);
            }

            let ids = LikeRepository::user_ids_for_photo(&self.db, photo_id).await?;
            UserRepository::find_by_ids(&self.db, &ids).await
        })
        .await
    }

    pub async fn liked_photos(&self, user_id: i64) -> Result<Vec<Photo>, AppError> {
        with_deadline(self.deadline, async {
            let ids = LikeRepository::photo_ids_for_user(&self.db, user_id).await?;
            PhotoRepository::find_by_ids(&self.db, &ids).await
        })
        .await
    }
}
