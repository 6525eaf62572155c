use sqlx::{Pool, Sqlite};
use crate::db::models::{Toggle, User};
use crate::error::AppError;

pub struct FollowRepository;

impl FollowRepository {
    /// Follow when the edge is absent, unfollow when it exists. Same
    /// conflict-aware shape as likes.
    pub async fn toggle(
        pool: &Pool<Sqlite>,
        follower_id: i64,
        following_id: i64,
    ) -> Result<Toggle, AppError> {
        let now = chrono::Utc::now().timestamp();

        let inserted = sqlx::query(
            r#"
INSERT INTO follows (follower_id, following_id, created_at)
VALUES (?, ?, ?)
ON CONFLICT(follower_id, following_id) DO NOTHING
            "#,
        )
        .bind(follower_id)
        .bind(following_id)
        .bind(now)
        .execute(pool)
        .await?;

        if inserted.rows_affected() == 1 {
            return Ok(Toggle::Added);
        }

        sqlx::query("DELETE FROM follows WHERE follower_id = ? AND following_id = ?")
            .bind(follower_id)
            .bind(following_id)
            .execute(pool)
            .await?;

        Ok(Toggle::Removed)
    }

    pub async fn is_following(
        pool: &Pool<Sqlite>,
        follower_id: i64,
        following_id: i64,
    ) -> Result<bool, AppError> {
        let found: Option<i64> = sqlx::query_scalar(
            "SELECT id FROM follows WHERE follower_id = ? AND following_id = ?"
        )
        .bind(follower_id)
        .bind(following_id)
        .fetch_optional(pool)
        .await?;

        Ok(found.is_some())
    }

    /// Users following `user_id`.
    pub async fn followers(pool: &Pool<Sqlite>, user_id: i64) -> Result<Vec<User>, AppError> {
        let users = sqlx::query_as::<_, User>(
            r#"
SELECT u.*
FROM follows f
JOIN users u ON f.follower_id = u.id
WHERE f.following_id = ?
ORDER BY f.created_at, f.id
            "#
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(users)
    }

    /// Users that `user_id` follows.
    pub async fn followings(pool: &Pool<Sqlite>, user_id: i64) -> Result<Vec<User>, AppError> {
        let users = sqlx::query_as::<_, User>(
            r#"
SELECT u.*
FROM follows f
JOIN users u ON f.following_id = u.id
WHERE f.follower_id = ?
ORDER BY f.created_at, f.id
            "#
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(users)
    }

    pub async fn count_followers(pool: &Pool<Sqlite>, user_id: i64) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM follows WHERE following_id = ?")
            .bind(user_id)
            .fetch_one(pool)
            .await?;

        Ok(count)
    }

    pub async fn count_followings(pool: &Pool<Sqlite>, user_id: i64) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM follows WHERE follower_id = ?")
            .bind(user_id)
            .fetch_one(pool)
            .await?;

        Ok(count)
    }
}
