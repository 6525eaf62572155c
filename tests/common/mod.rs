#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};

use mygram::api::{create_router, AppState};
use mygram::cache::{CodeStore, MemoryCodeStore};
use mygram::config::{Config, JwtConfig, MailConfig, MediaBackend, MediaConfig, VerificationConfig};
use mygram::db::{User, UserRepository};
use mygram::error::AppError;
use mygram::mail::{Mail, Mailer};
use mygram::media::MediaStore;

pub const PASSWORD: &str = "password1";

/// Records outgoing mail; can be switched into a failing relay.
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<Mail>>,
    pub failing: AtomicBool,
}

impl RecordingMailer {
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn sent_to(&self, email: &str) -> usize {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.to_email == email)
            .count()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, mail: Mail) -> Result<(), AppError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::MailDelivery("relay refused connection".to_string()));
        }
        self.sent.lock().unwrap().push(mail);
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryMediaStore {
    pub files: Mutex<HashMap<String, Vec<u8>>>,
}

#[async_trait]
impl MediaStore for MemoryMediaStore {
    async fn upload(&self, bytes: Vec<u8>, user_id: i64, extension: &str) -> Result<String, AppError> {
        let url = format!("mem://{}-images/{}.{}", user_id, uuid::Uuid::new_v4(), extension);
        self.files.lock().unwrap().insert(url.clone(), bytes);
        Ok(url)
    }

    async fn remove(&self, url: &str, _user_id: i64) -> Result<(), AppError> {
        self.files
            .lock()
            .unwrap()
            .remove(url)
            .map(|_| ())
            .ok_or(AppError::PhotoNotFound)
    }
}

pub struct TestApp {
    pub pool: Pool<Sqlite>,
    pub state: AppState,
    pub codes: MemoryCodeStore,
    pub mailer: Arc<RecordingMailer>,
    pub media: Arc<MemoryMediaStore>,
    db_path: PathBuf,
}

impl Drop for TestApp {
    fn drop(&mut self) {
        for suffix in ["", "-wal", "-shm"] {
            let mut path = self.db_path.clone().into_os_string();
            path.push(suffix);
            let _ = std::fs::remove_file(path);
        }
    }
}

impl TestApp {
    pub async fn new() -> Self {
        let db_path = std::env::temp_dir().join(format!("mygram-test-{}.db", uuid::Uuid::new_v4()));
        let pool = test_pool(&db_path).await;
        let codes = MemoryCodeStore::new();
        let mailer = Arc::new(RecordingMailer::default());
        let media = Arc::new(MemoryMediaStore::default());

        let state = AppState::new(
            Arc::new(test_config()),
            pool.clone(),
            Arc::new(codes.clone()),
            mailer.clone(),
            media.clone(),
        );

        Self {
            pool,
            state,
            codes,
            mailer,
            media,
            db_path,
        }
    }

    pub fn router(&self) -> Router {
        create_router(self.state.clone())
    }

    pub async fn pending_code(&self, email: &str) -> Option<String> {
        self.codes.get(email).await.unwrap()
    }

    /// Register through the use-case and confirm the mailed code.
    pub async fn verified_user(&self, username: &str) -> User {
        let email = format!("{}@x.com", username);
        let user = self.state.auth.register(username, &email, PASSWORD).await.unwrap();
        let code = self.pending_code(&email).await.unwrap();
        self.state.auth.verify_email(&email, &code).await.unwrap();
        user
    }

    /// Insert a user row directly, skipping password hashing and mail.
    pub async fn seed_user(&self, username: &str) -> User {
        let email = format!("{}@x.com", username);
        let user = UserRepository::create(&self.pool, username, &email, "not-a-real-hash")
            .await
            .unwrap();
        UserRepository::mark_verified(&self.pool, user.id, chrono::Utc::now().timestamp())
            .await
            .unwrap();
        user
    }
}

/// File-backed database with several connections so concurrent use-case
/// calls really interleave. The files are removed when the app is dropped.
pub async fn test_pool(path: &Path) -> Pool<Sqlite> {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(10));

    let pool = SqlitePoolOptions::new()
        .max_connections(4)
        .connect_with(options)
        .await
        .unwrap();

    mygram::db::migrate(&pool).await.unwrap();
    pool
}

pub fn test_config() -> Config {
    Config {
        server_host: "127.0.0.1".to_string(),
        server_port: 0,
        database_url: "sqlite::memory:".to_string(),
        db_max_connections: 4,
        db_min_connections: 1,
        request_timeout_secs: 60,
        // Generous so unoptimised password hashing never trips it
        usecase_timeout: Duration::from_secs(30),
        auth_max_attempts: 5,
        auth_attempt_window: Duration::from_secs(300),
        jwt: JwtConfig {
            access_secret: "test-access-secret".to_string(),
            refresh_secret: "test-refresh-secret".to_string(),
            access_ttl: Duration::from_secs(900),
            refresh_ttl: Duration::from_secs(86_400),
            janitor_interval: Duration::from_secs(3600),
        },
        verification: VerificationConfig {
            redis_url: None,
            code_ttl: Duration::from_secs(300),
        },
        mail: MailConfig {
            smtp_host: None,
            smtp_port: 587,
            username: String::new(),
            password: String::new(),
            from: "MyGram <noreply@mygram.test>".to_string(),
        },
        media: MediaConfig {
            backend: MediaBackend::Local,
            local_dir: "./images".to_string(),
            public_url: "http://localhost/images".to_string(),
            cloudinary_cloud_name: String::new(),
            cloudinary_api_key: String::new(),
            cloudinary_api_secret: String::new(),
            max_upload_bytes: 64 * 1024,
        },
    }
}
