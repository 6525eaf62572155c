use sqlx::{Pool, QueryBuilder, Sqlite};
use uuid::Uuid;
use crate::db::models::Photo;
use crate::error::AppError;

pub struct PhotoRepository;

impl PhotoRepository {
    pub async fn create(
        pool: &Pool<Sqlite>,
        caption: &str,
        photo_url: &str,
        user_id: i64,
    ) -> Result<Photo, AppError> {
        let id = Uuid::new_v4().to_string();
        let now = chrono::Utc::now().timestamp();

        let photo = sqlx::query_as::<_, Photo>(
            r#"
INSERT INTO photos (id, caption, photo_url, user_id, created_at, updated_at)
VALUES (?, ?, ?, ?, ?, ?)
RETURNING *
            "#,
        )
        .bind(&id)
        .bind(caption)
        .bind(photo_url)
        .bind(user_id)
        .bind(now)
        .bind(now)
        .fetch_one(pool)
        .await?;

        Ok(photo)
    }

    pub async fn get_by_id(
        pool: &Pool<Sqlite>,
        id: &str,
    ) -> Result<Option<Photo>, AppError> {
        let photo = sqlx::query_as::<_, Photo>(
            "SELECT * FROM photos WHERE id = ?"
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(photo)
    }

    pub async fn find_by_id(pool: &Pool<Sqlite>, id: &str) -> Result<Photo, AppError> {
        Self::get_by_id(pool, id).await?.ok_or(AppError::PhotoNotFound)
    }

    /// Lookup scoped to the owner; someone else's photo reads as missing.
    pub async fn find_by_id_and_user(
        pool: &Pool<Sqlite>,
        id: &str,
        user_id: i64,
    ) -> Result<Photo, AppError> {
        sqlx::query_as::<_, Photo>(
            "SELECT * FROM photos WHERE id = ? AND user_id = ?"
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::PhotoNotFound)
    }

    pub async fn exists(pool: &Pool<Sqlite>, id: &str) -> Result<bool, AppError> {
        let found: Option<String> = sqlx::query_scalar("SELECT id FROM photos WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(found.is_some())
    }

    pub async fn find_all(pool: &Pool<Sqlite>) -> Result<Vec<Photo>, AppError> {
        let photos = sqlx::query_as::<_, Photo>(
            "SELECT * FROM photos ORDER BY created_at DESC, id"
        )
        .fetch_all(pool)
        .await?;

        Ok(photos)
    }

    pub async fn find_by_user(pool: &Pool<Sqlite>, user_id: i64) -> Result<Vec<Photo>, AppError> {
        let photos = sqlx::query_as::<_, Photo>(
            "SELECT * FROM photos WHERE user_id = ? ORDER BY created_at DESC, id"
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(photos)
    }

    /// Batch fetch with a single `IN (...)` query.
    pub async fn find_by_ids(pool: &Pool<Sqlite>, ids: &[String]) -> Result<Vec<Photo>, AppError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut query = QueryBuilder::<Sqlite>::new("SELECT * FROM photos WHERE id IN (");
        let mut separated = query.separated(", ");
        for id in ids {
            separated.push_bind(id.as_str());
        }
        separated.push_unseparated(") ORDER BY created_at DESC, id");

        let photos = query.build_query_as::<Photo>().fetch_all(pool).await?;

        Ok(photos)
    }

    pub async fn count_by_user(pool: &Pool<Sqlite>, user_id: i64) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM photos WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(pool)
            .await?;

        Ok(count)
    }

    pub async fn update_caption(
        pool: &Pool<Sqlite>,
        id: &str,
        caption: &str,
    ) -> Result<Photo, AppError> {
        let now = chrono::Utc::now().timestamp();

        sqlx::query_as::<_, Photo>(
            "UPDATE photos SET caption = ?, updated_at = ? WHERE id = ? RETURNING *"
        )
        .bind(caption)
        .bind(now)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::PhotoNotFound)
    }

    pub async fn delete(pool: &Pool<Sqlite>, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM photos WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::PhotoNotFound);
        }

        Ok(())
    }
}
