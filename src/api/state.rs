use std::sync::Arc;

use sqlx::{Pool, Sqlite};

use crate::api::middleware::RateLimiter;
use crate::cache::CodeStore;
use crate::config::Config;
use crate::crypto::TokenIssuer;
use crate::mail::Mailer;
use crate::media::MediaStore;
use crate::service::{
    AuthService, CommentService, FollowService, LikeService, PhotoService, ProfileService, UploadService,
};

#[derive(Clone)]
pub struct AppState {
    pub db: Pool<Sqlite>,
    pub config: Arc<Config>,
    pub auth: AuthService,
    pub photos: PhotoService,
    pub comments: CommentService,
    pub likes: LikeService,
    pub follows: FollowService,
    pub profile: ProfileService,
    pub upload: UploadService,
    pub attempts: RateLimiter,
}

impl AppState {
    /// Wire every use-case from the shared handles.
    pub fn new(
        config: Arc<Config>,
        db: Pool<Sqlite>,
        codes: Arc<dyn CodeStore>,
        mailer: Arc<dyn Mailer>,
        media: Arc<dyn MediaStore>,
    ) -> Self {
        let deadline = config.usecase_timeout;
        let tokens = Arc::new(TokenIssuer::new(&config.jwt));

        Self {
            auth: AuthService::new(
                db.clone(),
                tokens,
                codes,
                mailer,
                config.verification.code_ttl,
                deadline,
            ),
            photos: PhotoService::new(db.clone(), media.clone(), deadline),
            comments: CommentService::new(db.clone(), deadline),
            likes: LikeService::new(db.clone(), deadline),
            follows: FollowService::new(db.clone(), deadline),
            profile: ProfileService::new(db.clone(), deadline),
            upload: UploadService::new(media, config.media.max_upload_bytes, deadline),
            attempts: RateLimiter::new(config.auth_max_attempts, config.auth_attempt_window),
            db,
            config,
        }
    }
}
