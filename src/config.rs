use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use crate::error::AppError;

#[derive(Clone, Debug)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub request_timeout_secs: u64,
    /// Deadline applied to every use-case call.
    pub usecase_timeout: Duration,
    /// Sign-in and verification attempts allowed per account and window.
    pub auth_max_attempts: u32,
    pub auth_attempt_window: Duration,
    pub jwt: JwtConfig,
    pub verification: VerificationConfig,
    pub mail: MailConfig,
    pub media: MediaConfig,
}

#[derive(Clone, Debug)]
pub struct JwtConfig {
    pub access_secret: String,
    pub refresh_secret: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
    /// How often expired refresh-token rows are swept.
    pub janitor_interval: Duration,
}

#[derive(Clone, Debug)]
pub struct VerificationConfig {
    /// Redis connection string. Codes live in process memory when unset.
    pub redis_url: Option<String>,
    pub code_ttl: Duration,
}

#[derive(Clone, Debug)]
pub struct MailConfig {
    /// SMTP relay. Mail is only logged when unset.
    pub smtp_host: Option<String>,
    pub smtp_port: u16,
    pub username: String,
    pub password: String,
    pub from: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MediaBackend {
    Local,
    Cloudinary,
}

#[derive(Clone, Debug)]
pub struct MediaConfig {
    pub backend: MediaBackend,
    pub local_dir: String,
    pub public_url: String,
    pub cloudinary_cloud_name: String,
    pub cloudinary_api_key: String,
    pub cloudinary_api_secret: String,
    pub max_upload_bytes: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let server_host = var_or("SERVER_HOST", "127.0.0.1");
        let server_port = parse_var("SERVER_PORT", "8080")?;

        let backend = match var_or("MEDIA_BACKEND", "local").to_lowercase().as_str() {
            "local" => MediaBackend::Local,
            "cloudinary" => MediaBackend::Cloudinary,
            other => {
                return Err(AppError::Config(format!("Invalid MEDIA_BACKEND: {}", other)));
            }
        };

        let media = MediaConfig {
            backend,
            local_dir: var_or("MEDIA_DIR", "./images"),
            public_url: var_or(
                "MEDIA_PUBLIC_URL",
                &format!("http://{}:{}/images", server_host, server_port),
            ),
            cloudinary_cloud_name: var_or("CLOUDINARY_CLOUD_NAME", ""),
            cloudinary_api_key: var_or("CLOUDINARY_API_KEY", ""),
            cloudinary_api_secret: var_or("CLOUDINARY_API_SECRET", ""),
            max_upload_bytes: parse_var("MAX_UPLOAD_BYTES", "2097152")?,
        };

        if media.backend == MediaBackend::Cloudinary
            && (media.cloudinary_cloud_name.is_empty()
                || media.cloudinary_api_key.is_empty()
                || media.cloudinary_api_secret.is_empty())
        {
            return Err(AppError::Config(
                "MEDIA_BACKEND=cloudinary needs CLOUDINARY_CLOUD_NAME, CLOUDINARY_API_KEY and CLOUDINARY_API_SECRET".to_string(),
            ));
        }

        let mail_user = var_or("MAIL_USER", "");

        Ok(Config {
            database_url: var_or("DATABASE_URL", "sqlite://mygram.db?mode=rwc"),
            db_max_connections: parse_var("DB_MAX_CONNECTIONS", "20")?,
            db_min_connections: parse_var("DB_MIN_CONNECTIONS", "5")?,
            request_timeout_secs: parse_var("REQUEST_TIMEOUT_SECS", "30")?,
            usecase_timeout: Duration::from_secs(parse_var("USECASE_TIMEOUT_SECS", "5")?),
            auth_max_attempts: parse_var("AUTH_MAX_ATTEMPTS", "5")?,
            auth_attempt_window: Duration::from_secs(parse_var("AUTH_ATTEMPT_WINDOW_SECS", "300")?),
            jwt: JwtConfig {
                access_secret: required_var("TOKEN_KEY")?,
                refresh_secret: required_var("REFRESH_KEY")?,
                access_ttl: minutes(parse_var("TOKEN_EXPIRY", "15")?),
                refresh_ttl: minutes(parse_var("REFRESH_EXPIRY", "10080")?),
                janitor_interval: Duration::from_secs(parse_var("JANITOR_INTERVAL_SECS", "3600")?),
            },
            verification: VerificationConfig {
                redis_url: std::env::var("REDIS_URL").ok().filter(|url| !url.is_empty()),
                code_ttl: Duration::from_secs(parse_var("VERIFICATION_TTL_SECS", "300")?),
            },
            mail: MailConfig {
                smtp_host: std::env::var("SMTP_HOST").ok().filter(|host| !host.is_empty()),
                smtp_port: parse_var("SMTP_PORT", "587")?,
                from: var_or("MAIL_FROM", &format!("MyGram <{}>", mail_user)),
                username: mail_user,
                password: var_or("MAIL_PASS", ""),
            },
            media,
            server_host,
            server_port,
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

fn minutes(value: u64) -> Duration {
    Duration::from_secs(value * 60)
}

fn var_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn required_var(key: &str) -> Result<String, AppError> {
    std::env::var(key)
        .ok()
        .filter(|value| !value.is_empty())
        .ok_or_else(|| AppError::Config(format!("{} must be set", key)))
}

fn parse_var<T>(key: &str, default: &str) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: Display,
{
    var_or(key, default)
        .parse()
        .map_err(|e| AppError::Config(format!("Invalid {}: {}", key, e)))
}
