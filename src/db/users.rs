use sqlx::{Pool, QueryBuilder, Sqlite};
use crate::db::models::User;
use crate::error::AppError;

pub struct UserRepository;

impl UserRepository {
    pub async fn create(
        pool: &Pool<Sqlite>,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User, AppError> {
        let now = chrono::Utc::now().timestamp();

        let user = sqlx::query_as::<_, User>(
            r#"
INSERT INTO users (username, email, password_hash, email_verified_at, created_at, updated_at)
VALUES (?, ?, ?, NULL, ?, ?)
RETURNING *
            "#,
        )
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .bind(now)
        .bind(now)
        .fetch_one(pool)
        .await
        .map_err(|e| match e {
            // Lost a race against a concurrent registration
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                if db.message().contains("users.email") {
                    AppError::EmailAlreadyUsed
                } else {
                    AppError::UsernameAlreadyUsed
                }
            }
            other => AppError::Database(other),
        })?;

        Ok(user)
    }

    pub async fn get_by_username(
        pool: &Pool<Sqlite>,
        username: &str,
    ) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE username = ?"
        )
        .bind(username)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    pub async fn get_by_email(
        pool: &Pool<Sqlite>,
        email: &str,
    ) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE email = ?"
        )
        .bind(email)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    pub async fn get_by_id(
        pool: &Pool<Sqlite>,
        id: i64,
    ) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE id = ?"
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    pub async fn find_by_id(pool: &Pool<Sqlite>, id: i64) -> Result<User, AppError> {
        Self::get_by_id(pool, id).await?.ok_or(AppError::UserNotFound)
    }

    pub async fn find_by_username(pool: &Pool<Sqlite>, username: &str) -> Result<User, AppError> {
        Self::get_by_username(pool, username)
            .await?
            .ok_or(AppError::UserNotFound)
    }

    pub async fn exists(pool: &Pool<Sqlite>, id: i64) -> Result<bool, AppError> {
        let found: Option<i64> = sqlx::query_scalar("SELECT id FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(found.is_some())
    }

    /// One round-trip for the whole id list.
    pub async fn find_by_ids(pool: &Pool<Sqlite>, ids: &[i64]) -> Result<Vec<User>, AppError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut query = QueryBuilder::<Sqlite>::new("SELECT * FROM users WHERE id IN (");
        let mut separated = query.separated(", ");
        for id in ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(") ORDER BY username");

        let users = query.build_query_as::<User>().fetch_all(pool).await?;

        Ok(users)
    }

    pub async fn mark_verified(
        pool: &Pool<Sqlite>,
        id: i64,
        verified_at: i64,
    ) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE users SET email_verified_at = ?, updated_at = ? WHERE id = ?"
        )
        .bind(verified_at)
        .bind(verified_at)
        .bind(id)
        .execute(pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::UserNotFound);
        }

        Ok(())
    }
}
