use sqlx::{Pool, Sqlite};
use crate::db::models::Authentication;
use crate::error::AppError;

/// Persisted refresh tokens. A row existing is what keeps a token usable;
/// signature and expiry are checked by the token issuer, not here.
pub struct AuthenticationRepository;

impl AuthenticationRepository {
    pub async fn create(
        pool: &Pool<Sqlite>,
        user_id: i64,
        refresh_token: &str,
        expires_at: i64,
    ) -> Result<Authentication, AppError> {
        let created_at = chrono::Utc::now().timestamp();

        let authentication = sqlx::query_as::<_, Authentication>(
            r#"
INSERT INTO authentications (user_id, refresh_token, expires_at, created_at)
VALUES (?, ?, ?, ?)
RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(refresh_token)
        .bind(expires_at)
        .bind(created_at)
        .fetch_one(pool)
        .await?;

        Ok(authentication)
    }

    pub async fn get_by_token(
        pool: &Pool<Sqlite>,
        refresh_token: &str,
    ) -> Result<Option<Authentication>, AppError> {
        let authentication = sqlx::query_as::<_, Authentication>(
            "SELECT * FROM authentications WHERE refresh_token = ?"
        )
        .bind(refresh_token)
        .fetch_optional(pool)
        .await?;

        Ok(authentication)
    }

    pub async fn find_by_token(
        pool: &Pool<Sqlite>,
        refresh_token: &str,
    ) -> Result<Authentication, AppError> {
        Self::get_by_token(pool, refresh_token)
            .await?
            .ok_or(AppError::RefreshTokenNotFound)
    }

    pub async fn delete(pool: &Pool<Sqlite>, id: i64) -> Result<(), AppError> {
        sqlx::query("DELETE FROM authentications WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(())
    }

    /// Drops every refresh token of the user; returns how many went away.
    pub async fn delete_for_user(pool: &Pool<Sqlite>, user_id: i64) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM authentications WHERE user_id = ?")
            .bind(user_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected())
    }

    pub async fn cleanup_expired(pool: &Pool<Sqlite>) -> Result<u64, AppError> {
        let now = chrono::Utc::now().timestamp();

        let result = sqlx::query("DELETE FROM authentications WHERE expires_at <= ?")
            .bind(now)
            .execute(pool)
            .await?;

        Ok(result.rows_affected())
    }
}
