pub mod authentications;
pub mod comments;
pub mod follows;
pub mod likes;
pub mod models;
pub mod photos;
pub mod tags;
pub mod users;

pub use authentications::AuthenticationRepository;
pub use comments::CommentRepository;
pub use follows::FollowRepository;
pub use likes::LikeRepository;
pub use models::{Authentication, Comment, Photo, Tag, Toggle, User};
pub use photos::PhotoRepository;
pub use tags::{PhotoTagRepository, TagRepository};
pub use users::UserRepository;

use sqlx::{Pool, Sqlite};

use crate::error::AppError;

/// Apply the embedded schema migrations.
pub async fn migrate(pool: &Pool<Sqlite>) -> Result<(), AppError> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| AppError::Internal(format!("Migration failed: {}", e)))
}
