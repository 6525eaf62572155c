use sqlx::{Pool, Sqlite};
use crate::db::models::Toggle;
use crate::error::AppError;

pub struct LikeRepository;

impl LikeRepository {
    /// Like when absent, unlike when present. The insert is conflict-aware,
    /// so a losing concurrent insert turns into the unlike instead of a
    /// duplicate row.
    pub async fn toggle(pool: &Pool<Sqlite>, user_id: i64, photo_id: &str) -> Result<Toggle, AppError> {
        let now = chrono::Utc::now().timestamp();

        let inserted = sqlx::query(
            r#"
INSERT INTO user_likes_photos (user_id, photo_id, created_at)
VALUES (?, ?, ?)
ON CONFLICT(user_id, photo_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(photo_id)
        .bind(now)
        .execute(pool)
        .await?;

        if inserted.rows_affected() == 1 {
            return Ok(Toggle::Added);
        }

        sqlx::query("DELETE FROM user_likes_photos WHERE user_id = ? AND photo_id = ?")
            .bind(user_id)
            .bind(photo_id)
            .execute(pool)
            .await?;

        Ok(Toggle::Removed)
    }

    pub async fn is_liked(pool: &Pool<Sqlite>, user_id: i64, photo_id: &str) -> Result<bool, AppError> {
        let found: Option<i64> = sqlx::query_scalar(
            "SELECT id FROM user_likes_photos WHERE user_id = ? AND photo_id = ?"
        )
        .bind(user_id)
        .bind(photo_id)
        .fetch_optional(pool)
        .await?;

        Ok(found.is_some())
    }

    pub async fn count_by_photo(pool: &Pool<Sqlite>, photo_id: &str) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM user_likes_photos WHERE photo_id = ?"
        )
        .bind(photo_id)
        .fetch_one(pool)
        .await?;

        Ok(count)
    }

    pub async fn user_ids_for_photo(pool: &Pool<Sqlite>, photo_id: &str) -> Result<Vec<i64>, AppError> {
        let ids = sqlx::query_scalar::<_, i64>(
            "SELECT user_id FROM user_likes_photos WHERE photo_id = ? ORDER BY created_at, id"
        )
        .bind(photo_id)
        .fetch_all(pool)
        .await?;

        Ok(ids)
    }

    pub async fn photo_ids_for_user(pool: &Pool<Sqlite>, user_id: i64) -> Result<Vec<String>, AppError> {
        let ids = sqlx::query_scalar::<_, String>(
            "SELECT photo_id FROM user_likes_photos WHERE user_id = ? ORDER BY created_at, id"
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(ids)
    }
}
