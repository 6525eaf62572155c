use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

/// Uniform JSON wrapper for every response, success or failure.
#[derive(Debug, Serialize)]
pub struct Envelope<T: Serialize> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}

impl<T: Serialize> Envelope<T> {
    pub fn success(message: impl Into<String>, payload: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            payload: Some(payload),
            error: None,
            error_code: None,
        }
    }

    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            payload: None,
            error: None,
            error_code: None,
        }
    }

    pub fn failure(message: String, error: String, code: &str) -> Self {
        Self {
            success: false,
            message,
            payload: None,
            error: Some(error),
            error_code: Some(code.to_string()),
        }
    }
}

pub type ApiResponse<T> = (StatusCode, Json<Envelope<T>>);

pub fn ok<T: Serialize>(message: impl Into<String>, payload: T) -> ApiResponse<T> {
    (StatusCode::OK, Json(Envelope::success(message, payload)))
}

pub fn created<T: Serialize>(message: impl Into<String>, payload: T) -> ApiResponse<T> {
    (StatusCode::CREATED, Json(Envelope::success(message, payload)))
}

/// Success with no payload.
pub fn done(message: impl Into<String>) -> ApiResponse<()> {
    (StatusCode::OK, Json(Envelope::message(message)))
}
