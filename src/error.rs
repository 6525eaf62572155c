use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use thiserror::Error;

use crate::api::response::Envelope;

/// Field-level validation failures, each with its own stable code.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FieldError {
    #[error("email invalid")]
    EmailInvalid,

    #[error("email is required")]
    EmailRequired,

    #[error("password is required")]
    PasswordRequired,

    #[error("password minimum length is 8")]
    PasswordInvalidLength,

    #[error("username is required")]
    UsernameRequired,

    #[error("username minimum length is 3")]
    UsernameInvalidLength,

    #[error("message is required")]
    CommentMessageRequired,

    #[error("refresh token is required")]
    RefreshTokenRequired,

    #[error("verification code is required")]
    CodeRequired,
}

impl FieldError {
    pub fn code(&self) -> &'static str {
        match self {
            FieldError::EmailInvalid => "40001",
            FieldError::EmailRequired => "40002",
            FieldError::PasswordRequired => "40003",
            FieldError::PasswordInvalidLength => "40004",
            FieldError::UsernameRequired => "40005",
            FieldError::UsernameInvalidLength => "40006",
            FieldError::CommentMessageRequired => "40007",
            FieldError::RefreshTokenRequired => "40012",
            FieldError::CodeRequired => "40013",
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("{0}")]
    Field(#[from] FieldError),

    #[error("your link is expired")]
    LinkExpired,

    #[error("verification code does not match")]
    CodeMismatch,

    #[error("file not supported")]
    FileNotSupported,

    #[error("file exceeds the maximum upload size")]
    FileTooLarge,

    #[error("email is already used")]
    EmailAlreadyUsed,

    #[error("username already used")]
    UsernameAlreadyUsed,

    #[error("email not found")]
    EmailNotFound,

    #[error("refresh token not found")]
    RefreshTokenNotFound,

    #[error("user not found")]
    UserNotFound,

    #[error("photo not found")]
    PhotoNotFound,

    #[error("comment not found")]
    CommentNotFound,

    #[error("password not match")]
    PasswordNotMatch,

    #[error("email not verified. Please verify your email first")]
    EmailNotVerified,

    #[error("{0}")]
    Unauthorized(String),

    #[error("forbidden error")]
    Forbidden,

    #[error("request timed out")]
    Timeout,

    #[error("no route for {0}")]
    RouteNotFound(String),

    #[error("method not allowed")]
    MethodNotAllowed,

    #[error("too many attempts, try again later")]
    TooManyAttempts,

    #[error("failed send email: {0}")]
    MailDelivery(String),

    #[error("media store error: {0}")]
    MediaStore(String),

    #[error("cache error: {0}")]
    Cache(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_)
            | AppError::Field(_)
            | AppError::LinkExpired
            | AppError::CodeMismatch
            | AppError::FileNotSupported
            | AppError::FileTooLarge => StatusCode::BAD_REQUEST,
            AppError::EmailAlreadyUsed | AppError::UsernameAlreadyUsed => StatusCode::CONFLICT,
            AppError::EmailNotFound
            | AppError::RefreshTokenNotFound
            | AppError::UserNotFound
            | AppError::PhotoNotFound
            | AppError::CommentNotFound
            | AppError::RouteNotFound(_) => StatusCode::NOT_FOUND,
            AppError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            AppError::PasswordNotMatch | AppError::EmailNotVerified | AppError::Unauthorized(_) => {
                StatusCode::UNAUTHORIZED
            }
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::Timeout => StatusCode::REQUEST_TIMEOUT,
            AppError::TooManyAttempts => StatusCode::TOO_MANY_REQUESTS,
            AppError::MediaStore(_) => StatusCode::BAD_GATEWAY,
            AppError::MailDelivery(_)
            | AppError::Cache(_)
            | AppError::Database(_)
            | AppError::Config(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable code sent as `error_code`.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::BadRequest(_) => "40000",
            AppError::Field(field) => field.code(),
            AppError::LinkExpired => "40008",
            AppError::FileNotSupported => "40009",
            AppError::CodeMismatch => "40010",
            AppError::FileTooLarge => "40011",
            AppError::PasswordNotMatch => "40101",
            AppError::EmailNotVerified => "40102",
            AppError::Unauthorized(_) => "40100",
            AppError::Forbidden => "40300",
            AppError::EmailNotFound => "40401",
            AppError::RefreshTokenNotFound => "40402",
            AppError::UserNotFound => "40403",
            AppError::PhotoNotFound => "40404",
            AppError::CommentNotFound => "40405",
            AppError::RouteNotFound(_) => "40400",
            AppError::MethodNotAllowed => "40500",
            AppError::Timeout => "40800",
            AppError::EmailAlreadyUsed => "40901",
            AppError::UsernameAlreadyUsed => "40902",
            AppError::TooManyAttempts => "42900",
            AppError::Database(_) => "50001",
            AppError::MailDelivery(_) => "50002",
            AppError::MediaStore(_) => "50003",
            AppError::Cache(_) => "50004",
            AppError::Config(_) | AppError::Internal(_) => "99999",
        }
    }

    /// Text that is safe to hand to a client. Server-side failures collapse
    /// to a generic line per kind.
    fn public_message(&self) -> String {
        match self {
            AppError::MailDelivery(_) => "failed send email".to_string(),
            AppError::MediaStore(_) => "media store unavailable".to_string(),
            AppError::Database(_) => "error repository".to_string(),
            AppError::Cache(_) | AppError::Config(_) | AppError::Internal(_) => {
                "general error".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<redis::RedisError> for AppError {
    fn from(err: redis::RedisError) -> Self {
        AppError::Cache(err.to_string())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<MultipartRejection> for AppError {
    fn from(rejection: MultipartRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return AppError::FileTooLarge;
        }
        AppError::BadRequest(format!("multipart error: {}", err.body_text()))
    }
}

// Axum IntoResponse implementation for HTTP errors
impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();

        if status.is_server_error() {
            tracing::error!(error_code = self.code(), "{}", self);
        } else {
            tracing::debug!(error_code = self.code(), "{}", self);
        }

        let message = if status.is_server_error() {
            "internal server error".to_string()
        } else {
            self.to_string()
        };

        let body = Envelope::<()>::failure(message, self.public_message(), self.code());

        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::response::IntoResponse;

    #[test]
    fn test_kinds_map_to_status() {
        assert_eq!(AppError::EmailAlreadyUsed.status(), StatusCode::CONFLICT);
        assert_eq!(AppError::PhotoNotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::EmailNotVerified.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::Forbidden.status(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::Timeout.status(), StatusCode::REQUEST_TIMEOUT);
        assert_eq!(AppError::TooManyAttempts.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(AppError::MethodNotAllowed.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(
            AppError::Field(FieldError::PasswordInvalidLength).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::MailDelivery("smtp down".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_internal_detail_is_not_leaked() {
        let response = AppError::Internal("secret stack trace".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(!text.contains("secret stack trace"));

        let body: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["error_code"], "99999");
    }
}
