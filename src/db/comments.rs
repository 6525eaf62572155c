use sqlx::{Pool, Sqlite};
use crate::db::models::Comment;
use crate::error::AppError;

pub struct CommentRepository;

impl CommentRepository {
    pub async fn create(
        pool: &Pool<Sqlite>,
        photo_id: &str,
        user_id: i64,
        message: &str,
    ) -> Result<Comment, AppError> {
        let now = chrono::Utc::now().timestamp();

        let id: i64 = sqlx::query_scalar(
            r#"
INSERT INTO comments (message, photo_id, user_id, created_at, updated_at)
VALUES (?, ?, ?, ?, ?)
RETURNING id
            "#,
        )
        .bind(message)
        .bind(photo_id)
        .bind(user_id)
        .bind(now)
        .bind(now)
        .fetch_one(pool)
        .await?;

        // Fetch with username joined
        let comment = Self::get_by_id(pool, id).await?
            .ok_or_else(|| AppError::Internal("Failed to fetch created comment".to_string()))?;

        Ok(comment)
    }

    pub async fn get_by_id(
        pool: &Pool<Sqlite>,
        id: i64,
    ) -> Result<Option<Comment>, AppError> {
        let comment = sqlx::query_as::<_, Comment>(
            r#"
SELECT c.id, c.message, c.photo_id, c.user_id, u.username, c.created_at, c.updated_at
FROM comments c
JOIN users u ON c.user_id = u.id
WHERE c.id = ?
            "#
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(comment)
    }

    /// Comment lookup that also requires it to hang off the given photo.
    pub async fn find_on_photo(
        pool: &Pool<Sqlite>,
        photo_id: &str,
        id: i64,
    ) -> Result<Comment, AppError> {
        match Self::get_by_id(pool, id).await? {
            Some(comment) if comment.photo_id == photo_id => Ok(comment),
            _ => Err(AppError::CommentNotFound),
        }
    }

    pub async fn find_by_photo(
        pool: &Pool<Sqlite>,
        photo_id: &str,
    ) -> Result<Vec<Comment>, AppError> {
        let comments = sqlx::query_as::<_, Comment>(
            r#"
SELECT c.id, c.message, c.photo_id, c.user_id, u.username, c.created_at, c.updated_at
FROM comments c
JOIN users u ON c.user_id = u.id
WHERE c.photo_id = ?
ORDER BY c.created_at ASC, c.id ASC
            "#
        )
        .bind(photo_id)
        .fetch_all(pool)
        .await?;

        Ok(comments)
    }

    pub async fn count_by_photo(pool: &Pool<Sqlite>, photo_id: &str) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM comments WHERE photo_id = ?")
            .bind(photo_id)
            .fetch_one(pool)
            .await?;

        Ok(count)
    }

    pub async fn update_message(
        pool: &Pool<Sqlite>,
        id: i64,
        message: &str,
    ) -> Result<Comment, AppError> {
        let now = chrono::Utc::now().timestamp();

        let result = sqlx::query("UPDATE comments SET message = ?, updated_at = ? WHERE id = ?")
            .bind(message)
            .bind(now)
            .bind(id)
            .execute(pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::CommentNotFound);
        }

        Self::get_by_id(pool, id).await?.ok_or(AppError::CommentNotFound)
    }

    pub async fn delete(pool: &Pool<Sqlite>, id: i64) -> Result<(), AppError> {
        sqlx::query("DELETE FROM comments WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(())
    }
}
