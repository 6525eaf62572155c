//! Use-cases. Each service owns the handles it needs and runs every call
//! under the configured deadline.

pub mod auth;
pub mod comments;
pub mod follows;
pub mod likes;
pub mod photos;
pub mod profile;
pub mod upload;

pub use auth::AuthService;
pub use comments::CommentService;
pub use follows::FollowService;
pub use likes::LikeService;
pub use photos::{PhotoResponse, PhotoService};
pub use profile::{ProfileService, UserProfileResponse};
pub use upload::UploadService;

use std::future::Future;
use std::time::Duration;

use crate::error::AppError;

/// Run `work` with a hard deadline. Expiry is reported as `AppError::Timeout`,
/// never as a business error.
pub async fn with_deadline<T, F>(deadline: Duration, work: F) -> Result<T, AppError>
where
    F: Future<Output = Result<T, AppError>>,
{
    tokio::time::timeout(deadline, work)
        .await
        .map_err(|_| AppError::Timeout)?
}

/// Partial-failure policy for read aggregates: a failed lookup is logged and
/// rendered as the type's zero value. A zero produced here is not a verified
/// zero.
pub(crate) fn or_default<T: Default>(result: Result<T, AppError>, lookup: &str, subject: &str) -> T {
    match result {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(lookup, subject, error = %e, "aggregate lookup failed, using default");
            T::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_deadline_expiry_is_timeout() {
        let result: Result<(), AppError> = with_deadline(Duration::from_secs(5), async {
            tokio::time::sleep(Duration::from_secs(6)).await;
            Ok(())
        })
        .await;

        assert!(matches!(result, Err(AppError::Timeout)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_passes_business_errors_through() {
        let result: Result<(), AppError> = with_deadline(Duration::from_secs(5), async {
            tokio::time::sleep(Duration::from_secs(1)).await;
            Err(AppError::PhotoNotFound)
        })
        .await;

        assert!(matches!(result, Err(AppError::PhotoNotFound)));
    }

    #[test]
    fn test_failed_lookup_renders_default() {
        let likes: i64 = or_default(Err(AppError::Internal("db gone".into())), "total_likes", "p1");
        assert_eq!(likes, 0);

        let tags: Vec<String> = or_default(Err(AppError::PhotoNotFound), "photo_tags", "p1");
        assert!(tags.is_empty());

        assert_eq!(or_default(Ok(7i64), "total_likes", "p1"), 7);
    }
}
