//! Integration tests for registration, login, lockout and password flows.

mod helpers;

use http::StatusCode;
use serde_json::json;

use helpers::{PASSWORD, TestApp};

#[tokio::test]
async fn test_register_verify_and_login() {
    let app = TestApp::new().await;

    let response = app
        .request(
            "POST",
            "/api/auth/register",
            Some(json!({
                "name": "Ana Lima",
                "email": "Ana@Example.com",
                "password": PASSWORD,
            })),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.data()["email"], "ana@example.com");
    assert_eq!(response.data()["emailVerified"], false);
    assert!(response.data().get("passwordHash").is_none());

    let blocked = app
        .request(
            "POST",
            "/api/auth/login",
            Some(json!({ "email": "ana@example.com", "password": PASSWORD })),
            None,
        )
        .await;
    assert_eq!(blocked.status, StatusCode::FORBIDDEN);
    assert_eq!(blocked.error_code(), Some("EMAIL_NOT_VERIFIED"));

    let code = app
        .state
        .repos
        .accounts
        .find_by_email("ana@example.com")
        .await
        .unwrap()
        .and_then(|a| a.verification_code)
        .unwrap();
    let verified = app
        .request(
            "POST",
            "/api/auth/verify-email",
            Some(json!({ "email": "ana@example.com", "code": code })),
            None,
        )
        .await;
    assert_eq!(verified.status, StatusCode::OK);

    let session = app.login("ana@example.com", PASSWORD).await;
    let me = app
        .request("GET", "/api/auth/me", None, Some(&session.access_token))
        .await;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.data()["emailVerified"], true);
}

#[tokio::test]
async fn test_register_duplicate_email() {
    let app = TestApp::new().await;
    app.create_account("dup@example.com", &[]).await;

    let response = app
        .request(
            "POST",
            "/api/auth/register",
            Some(json!({ "name": "Dup", "email": "DUP@example.com", "password": PASSWORD })),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::CONFLICT);
    assert_eq!(response.error_code(), Some("EMAIL_ALREADY_REGISTERED"));
}

#[tokio::test]
async fn test_register_rejects_weak_password_and_bad_email() {
    let app = TestApp::new().await;

    let weak = app
        .request(
            "POST",
            "/api/auth/register",
            Some(json!({ "name": "Weak", "email": "weak@example.com", "password": "password" })),
            None,
        )
        .await;
    assert_eq!(weak.status, StatusCode::BAD_REQUEST);
    assert_eq!(weak.error_code(), Some("WEAK_PASSWORD"));

    let bad_email = app
        .request(
            "POST",
            "/api/auth/register",
            Some(json!({ "name": "Bad", "email": "nope", "password": PASSWORD })),
            None,
        )
        .await;
    assert_eq!(bad_email.status, StatusCode::BAD_REQUEST);
    assert_eq!(bad_email.error_code(), Some("VALIDATION_ERROR"));
    assert_eq!(bad_email.body["success"], false);
    assert!(bad_email.body["data"].is_null());
}

#[tokio::test]
async fn test_login_failures_do_not_reveal_accounts() {
    let app = TestApp::new().await;
    app.create_account("known@example.com", &[]).await;

    let wrong_password = app
        .request(
            "POST",
            "/api/auth/login",
            Some(json!({ "email": "known@example.com", "password": "Wrong-Password-123" })),
            None,
        )
        .await;
    let unknown = app
        .request(
            "POST",
            "/api/auth/login",
            Some(json!({ "email": "ghost@example.com", "password": PASSWORD })),
            None,
        )
        .await;

    assert_eq!(wrong_password.status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown.status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_password.error_code(), Some("INVALID_CREDENTIALS"));
    assert_eq!(unknown.error_code(), Some("INVALID_CREDENTIALS"));
    assert_eq!(wrong_password.body["message"], unknown.body["message"]);
}

#[tokio::test]
async fn test_lockout_after_five_failures_survives_correct_password() {
    let app = TestApp::new().await;
    let id = app.create_account("locked@example.com", &[]).await;
    let bad = json!({ "email": "locked@example.com", "password": "Wrong-Password-123" });

    for _ in 0..4 {
        let response = app
            .request("POST", "/api/auth/login", Some(bad.clone()), None)
            .await;
        assert_eq!(response.error_code(), Some("INVALID_CREDENTIALS"));
    }

    let fifth = app.request("POST", "/api/auth/login", Some(bad), None).await;
    assert_eq!(fifth.status, StatusCode::FORBIDDEN);
    assert_eq!(fifth.error_code(), Some("ACCOUNT_LOCKED"));

    let account = app.state.repos.accounts.find_by_id(id).await.unwrap().unwrap();
    let lock_until = account.lock_until.unwrap();
    assert!(lock_until > chrono::Utc::now() + chrono::Duration::minutes(14));

    let sixth = app
        .request(
            "POST",
            "/api/auth/login",
            Some(json!({ "email": "locked@example.com", "password": PASSWORD })),
            None,
        )
        .await;
    assert_eq!(sixth.error_code(), Some("ACCOUNT_LOCKED"));
}

#[tokio::test]
async fn test_successful_login_resets_failure_counter() {
    let app = TestApp::new().await;
    let id = app.create_account("reset@example.com", &[]).await;

    for _ in 0..3 {
        app.request(
            "POST",
            "/api/auth/login",
            Some(json!({ "email": "reset@example.com", "password": "Wrong-Password-123" })),
            None,
        )
        .await;
    }
    app.login("reset@example.com", PASSWORD).await;

    let account = app.state.repos.accounts.find_by_id(id).await.unwrap().unwrap();
    assert_eq!(account.login_attempts, 0);
    assert!(account.lock_until.is_none());
    assert!(account.last_login_at.is_some());
}

#[tokio::test]
async fn test_me_requires_valid_bearer() {
    let app = TestApp::new().await;

    let missing = app.request("GET", "/api/auth/me", None, None).await;
    assert_eq!(missing.status, StatusCode::UNAUTHORIZED);
    assert_eq!(missing.error_code(), Some("UNAUTHORIZED"));

    let garbage = app
        .request("GET", "/api/auth/me", None, Some("not-a-jwt"))
        .await;
    assert_eq!(garbage.status, StatusCode::UNAUTHORIZED);
    assert_eq!(garbage.error_code(), Some("TOKEN_INVALID"));
}

#[tokio::test]
async fn test_change_password() {
    let app = TestApp::new().await;
    let session = app.account_session("change@example.com", &[]).await;
    let new_password = "Copper-Meadow-Falcon-77";

    let wrong_old = app
        .request(
            "PUT",
            "/api/auth/me/password",
            Some(json!({ "oldPassword": "not-it", "newPassword": new_password })),
            Some(&session.access_token),
        )
        .await;
    assert_eq!(wrong_old.status, StatusCode::BAD_REQUEST);
    assert_eq!(wrong_old.error_code(), Some("OLD_PASSWORD_INCORRECT"));

    let changed = app
        .request(
            "PUT",
            "/api/auth/me/password",
            Some(json!({ "oldPassword": PASSWORD, "newPassword": new_password })),
            Some(&session.access_token),
        )
        .await;
    assert_eq!(changed.status, StatusCode::OK);

    app.login("change@example.com", new_password).await;
}

#[tokio::test]
async fn test_password_reset_revokes_sessions() {
    let app = TestApp::new().await;
    let session = app.account_session("forgot@example.com", &[]).await;

    let unknown = app
        .request(
            "POST",
            "/api/auth/forgot-password",
            Some(json!({ "email": "nobody@example.com" })),
            None,
        )
        .await;
    let known = app
        .request(
            "POST",
            "/api/auth/forgot-password",
            Some(json!({ "email": "forgot@example.com" })),
            None,
        )
        .await;
    assert_eq!(unknown.status, StatusCode::OK);
    assert_eq!(known.status, StatusCode::OK);
    assert_eq!(unknown.body["message"], known.body["message"]);

    let code = app
        .state
        .repos
        .accounts
        .find_by_email("forgot@example.com")
        .await
        .unwrap()
        .and_then(|a| a.reset_code)
        .unwrap();

    let wrong = app
        .request(
            "POST",
            "/api/auth/verify-reset-code",
            Some(json!({ "email": "forgot@example.com", "code": "000000" })),
            None,
        )
        .await;
    if code != "000000" {
        assert_eq!(wrong.error_code(), Some("INVALID_RESET_CODE"));
    }

    let verified = app
        .request(
            "POST",
            "/api/auth/verify-reset-code",
            Some(json!({ "email": "forgot@example.com", "code": code })),
            None,
        )
        .await;
    assert_eq!(verified.status, StatusCode::OK);

    let new_password = "Granite-Willow-Comet-19";
    let reset = app
        .request(
            "POST",
            "/api/auth/reset-password",
            Some(json!({ "email": "forgot@example.com", "code": code, "newPassword": new_password })),
            None,
        )
        .await;
    assert_eq!(reset.status, StatusCode::OK);

    let refresh = app
        .request_with_cookie("POST", "/api/auth/refresh", None, None, Some(&session.refresh_token))
        .await;
    assert_eq!(refresh.status, StatusCode::UNAUTHORIZED);

    app.login("forgot@example.com", new_password).await;
}

#[tokio::test]
async fn test_verification_does_not_reveal_registered_emails() {
    let app = TestApp::new().await;
    app.create_account("known@example.com", &[]).await;

    for email in ["known@example.com", "unknown@example.com"] {
        let verify = app
            .request(
                "POST",
                "/api/auth/verify-email",
                Some(json!({ "email": email, "code": "123456" })),
                None,
            )
            .await;
        assert_eq!(verify.status, StatusCode::BAD_REQUEST);
        assert_eq!(verify.error_code(), Some("INVALID_VERIFICATION_CODE"));

        let resend = app
            .request(
                "POST",
                "/api/auth/resend-verification",
                Some(json!({ "email": email })),
                None,
            )
            .await;
        assert_eq!(resend.status, StatusCode::OK);
    }
}
