use std::sync::Arc;
use std::time::Duration;

use sqlx::{Pool, Sqlite};

use crate::cache::CodeStore;
use crate::crypto::{generate_code, hash_password, verify_password, TokenIssuer, TokenPair};
use crate::db::{AuthenticationRepository, User, UserRepository};
use crate::error::AppError;
use crate::mail::{Mail, Mailer};
use crate::service::with_deadline;

/// Registration, email verification and the refresh-token lifecycle.
#[derive(Clone)]
pub struct AuthService {
    db: Pool<Sqlite>,
    tokens: Arc<TokenIssuer>,
    codes: Arc<dyn CodeStore>,
    mailer: Arc<dyn Mailer>,
    code_ttl: Duration,
    deadline: Duration,
}

impl AuthService {
    pub fn new(
        db: Pool<Sqlite>,
        tokens: Arc<TokenIssuer>,
        codes: Arc<dyn CodeStore>,
        mailer: Arc<dyn Mailer>,
        code_ttl: Duration,
        deadline: Duration,
    ) -> Self {
        Self {
            db,
            tokens,
            codes,
            mailer,
            code_ttl,
            deadline,
        }
    }

    /// Create an unverified user and mail them a one-time code.
    ///
    /// A mail failure is reported but the user row is kept; the caller can
    /// recover through [`AuthService::resend_email`].
    pub async fn register(&self, username: &str, email: &str, password: &str) -> Result<User, AppError> {
        with_deadline(self.deadline, async {
            if UserRepository::get_by_email(&self.db, email).await?.is_some() {
                return Err(AppError::EmailAlreadyUsed);
            }

            if UserRepository::get_by_username(&self.db, username).await?.is_some() {
                return Err(AppError::UsernameAlreadyUsed);
            }

            let password_hash = hash_password(password)?;
            let user = UserRepository::create(&self.db, username, email, &password_hash).await?;
            tracing::info!(user_id = user.id, username = %user.username, "user registered");

            self.send_code(&user).await?;

            Ok(user)
        })
        .await
    }

    pub async fn verify_email(&self, email: &str, code: &str) -> Result<(), AppError> {
        with_deadline(self.deadline, async {
            let user = UserRepository::get_by_email(&self.db, email)
                .await?
                .ok_or(AppError::EmailNotFound)?;

            let stored = self.codes.get(email).await?.ok_or(AppError::LinkExpired)?;
            if code.is_empty() || stored != code {
                return Err(AppError::CodeMismatch);
            }

            UserRepository::mark_verified(&self.db, user.id, chrono::Utc::now().timestamp()).await?;
            self.codes.remove(email).await?;

            tracing::info!(user_id = user.id, "email verified");
            Ok(())
        })
        .await
    }

    /// Mail a fresh code, replacing any pending one.
    pub async fn resend_email(&self, email: &str) -> Result<(), AppError> {
        with_deadline(self.deadline, async {
            let user = UserRepository::get_by_email(&self.db, email)
                .await?
                .ok_or(AppError::EmailNotFound)?;

            self.send_code(&user).await
        })
        .await
    }

    async fn send_code(&self, user: &User) -> Result<(), AppError> {
        let code = generate_code();

        self.mailer
            .send(Mail::verification_code(&user.username, &user.email, &code, self.code_ttl))
            .await?;

        self.codes.put(&user.email, &code, self.code_ttl).await
    }

    /// Check credentials. The account must be verified before the password
    /// is even compared.
    pub async fn login(&self, username: &str, password: &str) -> Result<User, AppError> {
        with_deadline(self.deadline, async {
            let user = UserRepository::find_by_username(&self.db, username).await?;

            if !user.is_verified() {
                return Err(AppError::EmailNotVerified);
            }

            if !verify_password(password, &user.password_hash)? {
                return Err(AppError::PasswordNotMatch);
            }

            Ok(user)
        })
        .await
    }

    /// Login plus token issuance. Earlier refresh tokens of the user are
    /// rotated out.
    pub async fn sign_in(&self, username: &str, password: &str) -> Result<TokenPair, AppError> {
        let user = self.login(username, password).await?;

        with_deadline(self.deadline, async {
            let access_token = self.tokens.issue_access(user.id)?;
            let (refresh_token, claims) = self.tokens.issue_refresh(user.id)?;

            let rotated = AuthenticationRepository::delete_for_user(&self.db, user.id).await?;
            AuthenticationRepository::create(&self.db, user.id, &refresh_token, claims.exp).await?;

            tracing::info!(user_id = user.id, rotated, "user signed in");
            Ok(TokenPair {
                access_token,
                refresh_token,
            })
        })
        .await
    }

    /// Exchange a stored, still valid refresh token for a new access token.
    pub async fn refresh_access_token(&self, refresh_token: &str) -> Result<String, AppError> {
        with_deadline(self.deadline, async {
            let stored = AuthenticationRepository::find_by_token(&self.db, refresh_token).await?;
            let claims = self.tokens.verify_refresh(refresh_token)?;

            if claims.sub != stored.user_id {
                return Err(AppError::Unauthorized("refresh token is not valid".to_string()));
            }

            self.tokens.issue_access(claims.sub)
        })
        .await
    }

    /// Revoke a refresh token. An unknown token does not block the client
    /// from ending its session.
    pub async fn logout(&self, refresh_token: &str) -> Result<(), AppError> {
        with_deadline(self.deadline, async {
            match AuthenticationRepository::get_by_token(&self.db, refresh_token).await? {
                Some(stored) => {
                    AuthenticationRepository::delete(&self.db, stored.id).await?;
                    tracing::info!(user_id = stored.user_id, "user signed out");
                }
                None => tracing::warn!("sign out with unknown refresh token"),
            }

            Ok(())
        })
        .await
    }

    /// Resolve a bearer access token to a user id that still exists.
    pub async fn authenticate(&self, access_token: &str) -> Result<i64, AppError> {
        let claims = self.tokens.verify_access(access_token)?;

        with_deadline(self.deadline, async {
            if !UserRepository::exists(&self.db, claims.sub).await? {
                return Err(AppError::Unauthorized("sign in to proceed".to_string()));
            }

            Ok(claims.sub)
        })
        .await
    }

    /// Drop refresh-token rows whose encoded expiry has passed.
    pub async fn purge_expired_tokens(&self) -> Result<u64, AppError> {
        with_deadline(self.deadline, AuthenticationRepository::cleanup_expired(&self.db)).await
    }
}
