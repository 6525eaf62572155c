use axum::extract::State;
use serde::{Deserialize, Serialize};

use crate::api::extract::{AppJson, AppQuery};
use crate::api::response::{created, done, ok, ApiResponse};
use crate::api::state::AppState;
use crate::api::validation;
use crate::crypto::TokenPair;
use crate::error::AppError;

#[derive(Debug, Deserialize)]
pub struct SignUpRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct SignUpResponse {
    pub id: i64,
    pub email: String,
    pub username: String,
}

#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyEmailQuery {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct ResendEmailRequest {
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshTokenRequest {
    #[serde(default)]
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct AccessTokenResponse {
    pub access_token: String,
}

/// POST /signup
pub async fn sign_up(
    State(state): State<AppState>,
    AppJson(req): AppJson<SignUpRequest>,
) -> Result<ApiResponse<SignUpResponse>, AppError> {
    let username = req.username.trim();
    let email = req.email.trim();

    validation::username(username)?;
    validation::email(email)?;
    validation::password(&req.password)?;

    let user = state.auth.register(username, email, &req.password).await?;

    Ok(created(
        "registration successful, check your email for the verification code",
        SignUpResponse {
            id: user.id,
            email: user.email,
            username: user.username,
        },
    ))
}

/// GET /verify-email?email=..&token=..
pub async fn verify_email(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<VerifyEmailQuery>,
) -> Result<ApiResponse<()>, AppError> {
    let email = query.email.trim();
    let code = query.token.trim();

    validation::email(email)?;
    validation::code(code)?;

    let attempt_key = format!("verify:{}", email);
    state.attempts.check(&attempt_key).await?;
    state.auth.verify_email(email, code).await?;
    state.attempts.reset(&attempt_key).await;

    Ok(done("email verified successfully"))
}

/// POST /resend-email
pub async fn resend_email(
    State(state): State<AppState>,
    AppJson(req): AppJson<ResendEmailRequest>,
) -> Result<ApiResponse<()>, AppError> {
    let email = req.email.trim();
    validation::email(email)?;

    state.auth.resend_email(email).await?;

    Ok(done("verification code sent, check your email"))
}

/// POST /signin
pub async fn sign_in(
    State(state): State<AppState>,
    AppJson(req): AppJson<SignInRequest>,
) -> Result<ApiResponse<TokenPair>, AppError> {
    let username = req.username.trim();

    validation::username(username)?;
    validation::password(&req.password)?;

    let attempt_key = format!("signin:{}", username);
    state.attempts.check(&attempt_key).await?;
    let tokens = state.auth.sign_in(username, &req.password).await?;
    state.attempts.reset(&attempt_key).await;

    Ok(ok("sign in successful", tokens))
}

/// PUT /refresh
pub async fn refresh(
    State(state): State<AppState>,
    AppJson(req): AppJson<RefreshTokenRequest>,
) -> Result<ApiResponse<AccessTokenResponse>, AppError> {
    validation::refresh_token(&req.refresh_token)?;

    let access_token = state.auth.refresh_access_token(req.refresh_token.trim()).await?;

    Ok(ok("access token refreshed", AccessTokenResponse { access_token }))
}

/// DELETE /signout (requires auth)
pub async fn sign_out(
    State(state): State<AppState>,
    AppJson(req): AppJson<RefreshTokenRequest>,
) -> Result<ApiResponse<()>, AppError> {
    validation::refresh_token(&req.refresh_token)?;

    state.auth.logout(req.refresh_token.trim()).await?;

    Ok(done("sign out successful"))
}
