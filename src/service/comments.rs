use std::time::Duration;

use sqlx::{Pool, Sqlite};

use crate::db::{Comment, CommentRepository, PhotoRepository};
use crate::error::AppError;
use crate::service::with_deadline;

#[derive(Clone)]
pub struct CommentService {
    db: Pool<Sqlite>,
    deadline: Duration,
}

impl CommentService {
    pub fn new(db: Pool<Sqlite>, deadline: Duration) -> Self {
        Self { db, deadline }
    }

    pub async fn create(&self, photo_id: &str, user_id: i64, message: &str) -> Result<Comment, AppError> {
        with_deadline(self.deadline, async {
            if !PhotoRepository::exists(&self.db, photo_id).await? {
                return Err(AppError::PhotoNotFound);
            }

            let comment = CommentRepository::create(&self.db, photo_id, user_id, message).await?;
            tracing::debug!(comment_id = comment.id, photo_id, user_id, "comment created");
            Ok(comment)
        })
        .await
    }

    pub async fn list(&self, photo_id: &str) -> Result<Vec<Comment>, AppError> {
        with_deadline(self.deadline, async {
            if !PhotoRepository::exists(&self.db, photo_id).await? {
                return Err(AppError::PhotoNotFound);
            }

            CommentRepository::find_by_photo(&self.db, photo_id).await
        })
        .await
    }

    pub async fn get(&self, photo_id: &str, id: i64) -> Result<Comment, AppError> {
        with_deadline(self.deadline, CommentRepository::find_on_photo(&self.db, photo_id, id)).await
    }

    pub async fn update(&self, photo_id: &str, id: i64, user_id: i64, message: &str) -> Result<Comment, AppError> {
        with_deadline(self.deadline, async {
            self.owned(photo_id, id, user_id).await?;
            CommentRepository::update_message(&self.db, id, message).await
        })
        .await
    }

    pub async fn delete(&self, photo_id: &str, id: i64, user_id: i64) -> Result<(), AppError> {
        with_deadline(self.deadline, async {
            self.owned(photo_id, id, user_id).await?;
            CommentRepository::delete(&self.db, id).await
        })
        .await
    }

    async fn owned(&self, photo_id: &str, id: i64, user_id: i64) -> Result<Comment, AppError> {
        let comment = CommentRepository::find_on_photo(&self.db, photo_id, id).await?;
        if comment.user_id != user_id {
            return Err(AppError::Forbidden);
        }
        Ok(comment)
    }
}
