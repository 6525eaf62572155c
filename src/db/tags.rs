use sqlx::{Pool, Sqlite};
use crate::db::models::Tag;
use crate::error::AppError;

pub struct TagRepository;

impl TagRepository {
    /// Find-or-create by exact name. The insert is a no-op when the name is
    /// already taken, so two concurrent callers end up with the same row.
    pub async fn find_or_create(pool: &Pool<Sqlite>, name: &str) -> Result<Tag, AppError> {
        sqlx::query("INSERT INTO tags (name) VALUES (?) ON CONFLICT(name) DO NOTHING")
            .bind(name)
            .execute(pool)
            .await?;

        let tag = sqlx::query_as::<_, Tag>("SELECT * FROM tags WHERE name = ?")
            .bind(name)
            .fetch_one(pool)
            .await?;

        Ok(tag)
    }
}

/// Join rows between photos and tags.
pub struct PhotoTagRepository;

impl PhotoTagRepository {
    pub async fn add(pool: &Pool<Sqlite>, photo_id: &str, tag_id: i64) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO photo_tags (photo_id, tag_id) VALUES (?, ?) ON CONFLICT(photo_id, tag_id) DO NOTHING"
        )
        .bind(photo_id)
        .bind(tag_id)
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Tag names of a photo in the order they were attached.
    pub async fn tag_names_for_photo(
        pool: &Pool<Sqlite>,
        photo_id: &str,
    ) -> Result<Vec<String>, AppError> {
        let names = sqlx::query_scalar::<_, String>(
            r#"
SELECT t.name
FROM photo_tags pt
JOIN tags t ON pt.tag_id = t.id
WHERE pt.photo_id = ?
ORDER BY pt.id ASC
            "#
        )
        .bind(photo_id)
        .fetch_all(pool)
        .await?;

        Ok(names)
    }

    pub async fn delete_for_photo(pool: &Pool<Sqlite>, photo_id: &str) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM photo_tags WHERE photo_id = ?")
            .bind(photo_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected())
    }
}
