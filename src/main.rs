use std::sync::Arc;
use std::time::Duration;
use sqlx::sqlite::SqlitePoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mygram::{
    api::{create_router, AppState},
    cache::{CodeStore, MemoryCodeStore, RedisCodeStore},
    config::{Config, MediaBackend},
    db,
    error::AppError,
    mail::{LogMailer, Mailer, SmtpMailer},
    media::{CloudinaryStore, LocalMediaStore, MediaStore},
};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,mygram=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting MyGram server v{}...", env!("CARGO_PKG_VERSION"));

    let config = Arc::new(Config::from_env()?);
    tracing::info!("Configuration loaded");

    let pool = SqlitePoolOptions::new()
        .max_connections(config.db_max_connections)
        .min_connections(config.db_min_connections)
        .acquire_timeout(Duration::from_secs(30))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .connect(&config.database_url)
        .await?;

    tracing::info!("Database connected: {}", config.database_url);

    db::migrate(&pool).await?;
    tracing::info!("Database migrations completed");

    let codes: Arc<dyn CodeStore> = match &config.verification.redis_url {
        Some(url) => {
            let store = RedisCodeStore::connect(url).await?;
            tracing::info!("Verification codes stored in redis");
            Arc::new(store)
        }
        None => {
            let store = MemoryCodeStore::new();
            spawn_code_cleanup(store.clone(), config.verification.code_ttl);
            tracing::warn!("REDIS_URL not set, verification codes kept in memory");
            Arc::new(store)
        }
    };

    let mailer: Arc<dyn Mailer> = match &config.mail.smtp_host {
        Some(host) => Arc::new(SmtpMailer::new(host, &config.mail)?),
        None => {
            tracing::warn!("SMTP_HOST not set, verification mails are only logged");
            Arc::new(LogMailer)
        }
    };

    let media: Arc<dyn MediaStore> = match config.media.backend {
        MediaBackend::Local => {
            let store = LocalMediaStore::new(&config.media.local_dir, &config.media.public_url);
            tokio::fs::create_dir_all(store.root()).await?;
            tracing::info!("Media stored under {}", store.root().display());
            Arc::new(store)
        }
        MediaBackend::Cloudinary => {
            tracing::info!("Media stored in cloudinary ({})", config.media.cloudinary_cloud_name);
            Arc::new(CloudinaryStore::new(&config.media))
        }
    };

    let state = AppState::new(config.clone(), pool, codes, mailer, media);

    // Background sweep of expired refresh tokens
    {
        let auth = state.auth.clone();
        let every = config.jwt.janitor_interval;
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            loop {
                interval.tick().await;
                match auth.purge_expired_tokens().await {
                    Ok(removed) => tracing::debug!(removed, "Expired refresh tokens cleaned up"),
                    Err(e) => tracing::error!("Refresh token cleanup failed: {}", e),
                }
            }
        });
        tracing::info!("Refresh token janitor started (every {:?})", every);
    }

    {
        let attempts = state.attempts.clone();
        let every = config.auth_attempt_window.max(Duration::from_secs(1));
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            loop {
                interval.tick().await;
                attempts.cleanup().await;
                tracing::debug!("Stale attempt counters cleaned up");
            }
        });
    }

    let app = create_router(state);

    let addr = config.server_address();
    tracing::info!("Server listening on http://{}", addr);
    tracing::info!("Health check: http://{}/health", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to bind to {}: {}", addr, e)))?;

    axum::serve(listener, app)
        .await
        .map_err(|e| AppError::Internal(format!("Server error: {}", e)))?;

    Ok(())
}

fn spawn_code_cleanup(store: MemoryCodeStore, every: Duration) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        loop {
            interval.tick().await;
            store.cleanup().await;
            tracing::debug!("Expired verification codes cleaned up");
        }
    });
}
