pub mod auth;
pub mod comments;
pub mod extract;
pub mod middleware;
pub mod photos;
pub mod response;
pub mod social;
pub mod state;
pub mod upload;
pub mod validation;

pub use middleware::AuthUser;
pub use state::AppState;

use axum::{
    extract::DefaultBodyLimit,
    http::Uri,
    middleware as axum_middleware,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::Serialize;
use std::time::Duration;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::config::MediaBackend;
use crate::error::AppError;

// Multipart framing on top of the file itself
const MULTIPART_OVERHEAD: usize = 64 * 1024;

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

pub fn create_router(state: AppState) -> Router {
    let public = Router::new()
        .route("/health", get(health))
        .route("/signup", post(auth::sign_up))
        .route("/signin", post(auth::sign_in))
        .route("/verify-email", get(auth::verify_email))
        .route("/resend-email", post(auth::resend_email))
        .route("/refresh", put(auth::refresh));

    let photo_owner = axum_middleware::from_fn_with_state(state.clone(), middleware::require_photo_owner);
    let comment_owner = axum_middleware::from_fn_with_state(state.clone(), middleware::require_comment_owner);

    let protected = Router::new()
        .route("/signout", delete(auth::sign_out))
        .route(
            "/files/upload",
            post(upload::upload_file).layer(DefaultBodyLimit::max(
                state.config.media.max_upload_bytes + MULTIPART_OVERHEAD,
            )),
        )
        .route("/photos", post(photos::create_photo).get(photos::list_photos))
        .route(
            "/photos/:id",
            get(photos::get_photo).merge(
                put(photos::update_photo)
                    .delete(photos::delete_photo)
                    .route_layer(photo_owner),
            ),
        )
        .route("/photos/:id/likes", post(social::toggle_like).get(social::photo_likers))
        .route(
            "/photos/:id/comments",
            post(comments::create_comment).get(comments::list_comments),
        )
        .route(
            "/photos/:id/comments/:comment_id",
            get(comments::get_comment).merge(
                put(comments::update_comment)
                    .delete(comments::delete_comment)
                    .route_layer(comment_owner),
            ),
        )
        .route("/me/photos", get(photos::my_photos))
        .route("/me/liked/photos", get(social::liked_photos))
        .route("/users/:user/follows", post(social::toggle_follow))
        .route("/users/:user/followers", get(social::followers))
        .route("/users/:user/followings", get(social::followings))
        .route("/users/profile/:username", get(social::profile))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth_middleware,
        ));

    let mut router = public.merge(protected);

    if state.config.media.backend == MediaBackend::Local {
        router = router.nest_service("/images", ServeDir::new(&state.config.media.local_dir));
    }

    let request_timeout = Duration::from_secs(state.config.request_timeout_secs);

    router
        .fallback(route_not_found)
        .method_not_allowed_fallback(method_not_allowed)
        .layer(axum_middleware::from_fn_with_state(
            request_timeout,
            middleware::request_deadline,
        ))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn route_not_found(uri: Uri) -> AppError {
    AppError::RouteNotFound(uri.path().to_string())
}

async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}
