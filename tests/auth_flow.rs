mod common;

use common::{TestApp, PASSWORD};
use mygram::cache::CodeStore;
use mygram::db::{AuthenticationRepository, UserRepository};
use mygram::error::AppError;

async fn user_count(app: &TestApp) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(&app.pool)
        .await
        .unwrap()
}

#[tokio::test]
async fn test_duplicate_registration_conflicts() {
    let app = TestApp::new().await;
    let auth = &app.state.auth;

    auth.register("alice", "a@x.com", PASSWORD).await.unwrap();

    let same_email = auth.register("alice2", "a@x.com", PASSWORD).await;
    assert!(matches!(same_email, Err(AppError::EmailAlreadyUsed)));

    let same_username = auth.register("alice", "other@x.com", PASSWORD).await;
    assert!(matches!(same_username, Err(AppError::UsernameAlreadyUsed)));

    assert_eq!(user_count(&app).await, 1);
}

#[tokio::test]
async fn test_register_sends_exactly_one_mail() {
    let app = TestApp::new().await;
    app.state.auth.register("alice", "a@x.com", PASSWORD).await.unwrap();

    assert_eq!(app.mailer.sent_to("a@x.com"), 1);

    let code = app.pending_code("a@x.com").await.unwrap();
    assert_eq!(code.len(), 4);
    let sent = app.mailer.sent.lock().unwrap();
    assert!(sent[0].html_body.contains(&code));
}

#[tokio::test]
async fn test_login_requires_verified_email() {
    let app = TestApp::new().await;
    let auth = &app.state.auth;

    auth.register("alice", "a@x.com", PASSWORD).await.unwrap();

    let before = auth.login("alice", PASSWORD).await;
    assert!(matches!(before, Err(AppError::EmailNotVerified)));

    let code = app.pending_code("a@x.com").await.unwrap();
    let wrong = if code == "1000" { "1001" } else { "1000" };

    let mismatch = auth.verify_email("a@x.com", wrong).await;
    assert!(matches!(mismatch, Err(AppError::CodeMismatch)));
    let user = UserRepository::find_by_username(&app.pool, "alice").await.unwrap();
    assert!(!user.is_verified());

    auth.verify_email("a@x.com", &code).await.unwrap();

    let user = auth.login("alice", PASSWORD).await.unwrap();
    assert!(user.is_verified());

    let bad_password = auth.login("alice", "password2").await;
    assert!(matches!(bad_password, Err(AppError::PasswordNotMatch)));

    let unknown = auth.login("bob", PASSWORD).await;
    assert!(matches!(unknown, Err(AppError::UserNotFound)));
}

#[tokio::test]
async fn test_expired_code_does_not_verify() {
    let app = TestApp::new().await;
    let auth = &app.state.auth;

    auth.register("alice", "a@x.com", PASSWORD).await.unwrap();
    let code = app.pending_code("a@x.com").await.unwrap();

    // TTL eviction by the store
    app.codes.remove("a@x.com").await.unwrap();

    let result = auth.verify_email("a@x.com", &code).await;
    assert!(matches!(result, Err(AppError::LinkExpired)));

    let user = UserRepository::find_by_username(&app.pool, "alice").await.unwrap();
    assert!(!user.is_verified());
}

#[tokio::test]
async fn test_code_is_consumed_by_verification() {
    let app = TestApp::new().await;
    let auth = &app.state.auth;

    auth.register("alice", "a@x.com", PASSWORD).await.unwrap();
    let code = app.pending_code("a@x.com").await.unwrap();

    auth.verify_email("a@x.com", &code).await.unwrap();

    let replay = auth.verify_email("a@x.com", &code).await;
    assert!(matches!(replay, Err(AppError::LinkExpired)));
}

#[tokio::test]
async fn test_verify_unknown_email() {
    let app = TestApp::new().await;
    let result = app.state.auth.verify_email("nobody@x.com", "1234").await;
    assert!(matches!(result, Err(AppError::EmailNotFound)));
}

#[tokio::test]
async fn test_mail_failure_keeps_user_and_resend_recovers() {
    let app = TestApp::new().await;
    let auth = &app.state.auth;

    app.mailer.set_failing(true);
    let result = auth.register("alice", "a@x.com", PASSWORD).await;
    assert!(matches!(result, Err(AppError::MailDelivery(_))));
    assert_eq!(user_count(&app).await, 1);
    assert_eq!(app.pending_code("a@x.com").await, None);

    app.mailer.set_failing(false);
    auth.resend_email("a@x.com").await.unwrap();
    assert_eq!(app.mailer.sent_to("a@x.com"), 1);

    let code = app.pending_code("a@x.com").await.unwrap();
    auth.verify_email("a@x.com", &code).await.unwrap();
    auth.login("alice", PASSWORD).await.unwrap();
}

#[tokio::test]
async fn test_resend_replaces_pending_code() {
    let app = TestApp::new().await;
    let auth = &app.state.auth;

    auth.register("alice", "a@x.com", PASSWORD).await.unwrap();
    auth.resend_email("a@x.com").await.unwrap();
    assert_eq!(app.mailer.sent_to("a@x.com"), 2);

    let latest = {
        let sent = app.mailer.sent.lock().unwrap();
        sent[1].html_body.clone()
    };
    let code = app.pending_code("a@x.com").await.unwrap();
    assert!(latest.contains(&code));

    let unknown = auth.resend_email("nobody@x.com").await;
    assert!(matches!(unknown, Err(AppError::EmailNotFound)));
}

#[tokio::test]
async fn test_token_lifecycle() {
    let app = TestApp::new().await;
    let auth = &app.state.auth;
    let alice = app.verified_user("alice").await;

    let first = auth.sign_in("alice", PASSWORD).await.unwrap();
    assert_eq!(auth.authenticate(&first.access_token).await.unwrap(), alice.id);

    let access = auth.refresh_access_token(&first.refresh_token).await.unwrap();
    assert_eq!(auth.authenticate(&access).await.unwrap(), alice.id);

    // A new login rotates the earlier refresh token out
    let second = auth.sign_in("alice", PASSWORD).await.unwrap();
    let stale = auth.refresh_access_token(&first.refresh_token).await;
    assert!(matches!(stale, Err(AppError::RefreshTokenNotFound)));

    auth.logout(&second.refresh_token).await.unwrap();
    let revoked = auth.refresh_access_token(&second.refresh_token).await;
    assert!(matches!(revoked, Err(AppError::RefreshTokenNotFound)));

    // Unknown tokens do not block sign out
    auth.logout("not-a-token").await.unwrap();
}

#[tokio::test]
async fn test_access_token_is_not_a_refresh_token() {
    let app = TestApp::new().await;
    let auth = &app.state.auth;
    app.verified_user("alice").await;

    let tokens = auth.sign_in("alice", PASSWORD).await.unwrap();

    let result = auth.refresh_access_token(&tokens.access_token).await;
    assert!(matches!(result, Err(AppError::RefreshTokenNotFound)));

    let result = auth.authenticate(&tokens.refresh_token).await;
    assert!(matches!(result, Err(AppError::Unauthorized(_))));
}

#[tokio::test]
async fn test_janitor_purges_only_expired_rows() {
    let app = TestApp::new().await;
    let alice = app.seed_user("alice").await;
    let now = chrono::Utc::now().timestamp();

    AuthenticationRepository::create(&app.pool, alice.id, "expired", now - 10).await.unwrap();
    AuthenticationRepository::create(&app.pool, alice.id, "live", now + 3600).await.unwrap();

    assert_eq!(app.state.auth.purge_expired_tokens().await.unwrap(), 1);
    assert!(AuthenticationRepository::get_by_token(&app.pool, "expired").await.unwrap().is_none());
    assert!(AuthenticationRepository::get_by_token(&app.pool, "live").await.unwrap().is_some());
}
