use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::api::extract::AppPath;
use crate::api::state::AppState;
use crate::db::{CommentRepository, PhotoRepository};
use crate::error::AppError;

/// Identity of the bearer, placed in request extensions by [`auth_middleware`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub id: i64,
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .copied()
            .ok_or_else(|| AppError::Unauthorized("sign in to proceed".to_string()))
    }
}

/// Authentication middleware - validates bearer access tokens
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("sign in to proceed".to_string()))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Unauthorized("invalid authorization format".to_string()))?;

    let user_id = state.auth.authenticate(token).await?;

    request.extensions_mut().insert(AuthUser { id: user_id });

    Ok(next.run(request).await)
}

/// Fixed-window attempt counter for guessable credentials. Keys name the
/// account being tried, so rotating client addresses does not reset them.
#[derive(Clone)]
pub struct RateLimiter {
    // key -> (count, window_start)
    state: Arc<Mutex<HashMap<String, (u32, Instant)>>>,
    max_attempts: u32,
    window: Duration,
}

impl RateLimiter {
    pub fn new(max_attempts: u32, window: Duration) -> Self {
        Self {
            state: Arc::new(Mutex::new(HashMap::new())),
            max_attempts,
            window,
        }
    }

    pub async fn check(&self, key: &str) -> Result<(), AppError> {
        let mut state = self.state.lock().await;
        let now = Instant::now();

        let entry = state.entry(key.to_string()).or_insert((0, now));

        if now.duration_since(entry.1) > self.window {
            *entry = (1, now);
            return Ok(());
        }

        if entry.0 < self.max_attempts {
            entry.0 += 1;
            Ok(())
        } else {
            tracing::warn!(key, "attempt limit reached");
            Err(AppError::TooManyAttempts)
        }
    }

    /// Forget the key after a successful attempt.
    pub async fn reset(&self, key: &str) {
        self.state.lock().await.remove(key);
    }

    /// Periodic cleanup of old entries
    pub async fn cleanup(&self) {
        let mut state = self.state.lock().await;
        let now = Instant::now();
        state.retain(|_, (_, started)| now.duration_since(*started) <= self.window);
    }
}

/// Whole-request deadline. Expiry renders the regular error envelope.
pub async fn request_deadline(
    State(limit): State<Duration>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    tokio::time::timeout(limit, next.run(request))
        .await
        .map_err(|_| AppError::Timeout)
}

fn path_param<'a>(params: &'a HashMap<String, String>, name: &str) -> Result<&'a str, AppError> {
    params
        .get(name)
        .map(String::as_str)
        .ok_or_else(|| AppError::BadRequest(format!("missing path parameter {}", name)))
}

/// Only the owner may modify a photo. Missing photo is 404, someone else's is 403.
pub async fn require_photo_owner(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(params): AppPath<HashMap<String, String>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let photo_id = path_param(&params, "id")?;
    let photo = PhotoRepository::find_by_id(&state.db, photo_id).await?;

    if photo.user_id != user.id {
        tracing::debug!(photo_id, user_id = user.id, "photo ownership check failed");
        return Err(AppError::Forbidden);
    }

    Ok(next.run(request).await)
}

/// Only the author may modify a comment.
pub async fn require_comment_owner(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(params): AppPath<HashMap<String, String>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let photo_id = path_param(&params, "id")?;
    let comment_id = path_param(&params, "comment_id")?
        .parse::<i64>()
        .map_err(|_| AppError::CommentNotFound)?;

    let comment = CommentRepository::find_on_photo(&state.db, photo_id, comment_id).await?;

    if comment.user_id != user.id {
        tracing::debug!(comment_id, user_id = user.id, "comment ownership check failed");
        return Err(AppError::Forbidden);
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::StatusCode, middleware::from_fn_with_state, routing::get, Router};
    use tower::ServiceExt;

    #[tokio::test(start_paused = true)]
    async fn test_limiter_blocks_after_max_attempts() {
        let limiter = RateLimiter::new(3, Duration::from_secs(60));

        for _ in 0..3 {
            limiter.check("verify:a@x.com").await.unwrap();
        }
        assert!(matches!(limiter.check("verify:a@x.com").await, Err(AppError::TooManyAttempts)));

        // Other keys are counted separately
        limiter.check("verify:b@x.com").await.unwrap();

        tokio::time::advance(Duration::from_secs(61)).await;
        limiter.check("verify:a@x.com").await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_limiter_reset_and_cleanup() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));

        limiter.check("signin:alice").await.unwrap();
        limiter.reset("signin:alice").await;
        limiter.check("signin:alice").await.unwrap();

        limiter.check("signin:bob").await.unwrap();
        tokio::time::advance(Duration::from_secs(61)).await;
        limiter.cleanup().await;
        assert!(limiter.state.lock().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_request_deadline_renders_envelope() {
        let app = Router::new()
            .route(
                "/slow",
                get(|| async {
                    tokio::time::sleep(Duration::from_secs(10)).await;
                    "late"
                }),
            )
            .layer(from_fn_with_state(Duration::from_secs(1), request_deadline));

        let request = axum::http::Request::builder().uri("/slow").body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["error_code"], "40800");
    }
}
