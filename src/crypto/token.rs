use std::time::Duration;

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::JwtConfig;
use crate::error::AppError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// User id
    pub sub: i64,
    pub iat: i64,
    pub exp: i64,
    pub jti: Uuid,
}

#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Signs and verifies access and refresh tokens. The two kinds use separate
/// secrets so one can never stand in for the other.
pub struct TokenIssuer {
    access_enc: EncodingKey,
    access_dec: DecodingKey,
    refresh_enc: EncodingKey,
    refresh_dec: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenIssuer {
    pub fn new(cfg: &JwtConfig) -> Self {
        Self {
            access_enc: EncodingKey::from_secret(cfg.access_secret.as_bytes()),
            access_dec: DecodingKey::from_secret(cfg.access_secret.as_bytes()),
            refresh_enc: EncodingKey::from_secret(cfg.refresh_secret.as_bytes()),
            refresh_dec: DecodingKey::from_secret(cfg.refresh_secret.as_bytes()),
            access_ttl: cfg.access_ttl,
            refresh_ttl: cfg.refresh_ttl,
        }
    }

    pub fn issue_access(&self, user_id: i64) -> Result<String, AppError> {
        let claims = claims_for(user_id, self.access_ttl);
        sign(&claims, &self.access_enc)
    }

    /// Returns the token together with its claims so the caller can persist
    /// the expiry.
    pub fn issue_refresh(&self, user_id: i64) -> Result<(String, Claims), AppError> {
        let claims = claims_for(user_id, self.refresh_ttl);
        let token = sign(&claims, &self.refresh_enc)?;
        Ok((token, claims))
    }

    pub fn verify_access(&self, token: &str) -> Result<Claims, AppError> {
        decode(token, &self.access_dec).map_err(|kind| match kind {
            ErrorKind::ExpiredSignature => AppError::Unauthorized("access token expired".to_string()),
            _ => AppError::Unauthorized("sign in to proceed".to_string()),
        })
    }

    pub fn verify_refresh(&self, token: &str) -> Result<Claims, AppError> {
        decode(token, &self.refresh_dec).map_err(|kind| match kind {
            ErrorKind::ExpiredSignature => AppError::Unauthorized("refresh token expired".to_string()),
            _ => AppError::Unauthorized("refresh token is not valid".to_string()),
        })
    }
}

fn claims_for(user_id: i64, ttl: Duration) -> Claims {
    let now = chrono::Utc::now().timestamp();
    Claims {
        sub: user_id,
        iat: now,
        exp: now + ttl.as_secs() as i64,
        jti: Uuid::new_v4(),
    }
}

fn sign(claims: &Claims, key: &EncodingKey) -> Result<String, AppError> {
    jsonwebtoken::encode(&Header::new(Algorithm::HS256), claims, key)
        .map_err(|e| AppError::Internal(format!("Token signing failed: {}", e)))
}

fn decode(token: &str, key: &DecodingKey) -> Result<Claims, ErrorKind> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;

    jsonwebtoken::decode::<Claims>(token, key, &validation)
        .map(|data| data.claims)
        .map_err(|e| e.into_kind())
}
