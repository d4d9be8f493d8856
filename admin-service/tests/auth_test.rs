mod common;

use admin_service::handlers::auth::FORGOT_PASSWORD_MESSAGE;
use admin_service::services::CredentialStore;
use axum::http::{Method, StatusCode};
use chrono::{Duration, Utc};
use common::{body_json, request, reset_token_from, test_config, TestApp, TEST_PASSWORD};
use serde_json::json;

#[tokio::test]
async fn test_login_returns_token_and_sanitized_user() {
    let app = TestApp::new().await;
    let user = app.seed_user("alice", false).await;

    let res = app
        .send(request(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "userName": "alice", "password": TEST_PASSWORD })),
        ))
        .await;
    assert_eq!(res.status(), StatusCode::OK);

    let body = body_json(res).await;
    assert_eq!(body["respCode"], 200);
    assert_eq!(body["message"], "Login successful");
    assert_eq!(body["data"]["user"]["id"], user.id);
    assert_eq!(body["data"]["user"]["userName"], "alice");
    assert!(body["data"]["user"].get("password").is_none());
    assert!(body["data"]["user"].get("resetToken").is_none());

    let token = body["data"]["token"].as_str().unwrap();
    let claims = app.state.tokens.verify(token).unwrap();
    assert_eq!(claims.id, user.id);
    assert!(!claims.super_admin);
}

#[tokio::test]
async fn test_login_failures_are_indistinguishable() {
    let app = TestApp::new().await;
    app.seed_user("alice", false).await;

    let wrong_password = app
        .send(request(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "userName": "alice", "password": "not-the-password" })),
        ))
        .await;
    let unknown_user = app
        .send(request(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "userName": "nobody", "password": TEST_PASSWORD })),
        ))
        .await;

    assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_user.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(wrong_password).await, body_json(unknown_user).await);
}

#[tokio::test]
async fn test_login_requires_both_fields() {
    let app = TestApp::new().await;

    let res = app
        .send(request(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "userName": "alice" })),
        ))
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(res).await["respCode"], 400);
}

#[tokio::test]
async fn test_forgot_password_does_not_reveal_unknown_email() {
    let app = TestApp::new().await;
    app.seed_user("alice", false).await;

    let known = app
        .send(request(
            Method::POST,
            "/api/auth/forgot-password",
            None,
            Some(json!({ "email": "alice@example.org" })),
        ))
        .await;
    let unknown = app
        .send(request(
            Method::POST,
            "/api/auth/forgot-password",
            None,
            Some(json!({ "email": "ghost@example.org" })),
        ))
        .await;

    assert_eq!(known.status(), StatusCode::OK);
    assert_eq!(unknown.status(), StatusCode::OK);
    assert_eq!(body_json(known).await, body_json(unknown).await);

    let sent = app.email.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "alice@example.org");
    assert!(sent[0].body.contains("reset-password?token="));
    assert!(sent[0].body.contains("email=alice%40example.org"));
}

#[tokio::test]
async fn test_forgot_password_rejects_malformed_email() {
    let app = TestApp::new().await;

    let res = app
        .send(request(
            Method::POST,
            "/api/auth/forgot-password",
            None,
            Some(json!({ "email": "not-an-email" })),
        ))
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_forgot_password_reports_mail_failure() {
    let app = TestApp::new().await;
    app.seed_user("alice", false).await;
    app.email.fail_sends(true);

    let res = app
        .send(request(
            Method::POST,
            "/api/auth/forgot-password",
            None,
            Some(json!({ "email": "alice@example.org" })),
        ))
        .await;
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_reset_flow_signs_user_in_and_consumes_ticket() {
    let app = TestApp::new().await;
    let user = app.seed_user("alice", false).await;

    let res = app
        .send(request(
            Method::POST,
            "/api/auth/forgot-password",
            None,
            Some(json!({ "email": "alice@example.org" })),
        ))
        .await;
    assert_eq!(body_json(res).await["message"], FORGOT_PASSWORD_MESSAGE);
    let token = reset_token_from(&app.email.sent()[0].body);

    let validate_uri = format!(
        "/api/auth/reset-password/validate?token={}&email=alice%40example.org",
        token
    );
    let res = app.send(request(Method::GET, &validate_uri, None, None)).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body = body_json(res).await;
    assert_eq!(body["message"], "Reset token is valid");
    assert!(body["data"].is_null());

    let res = app
        .send(request(
            Method::POST,
            "/api/auth/reset-password",
            None,
            Some(json!({ "token": token, "email": "alice@example.org", "password": "brand-new-pass" })),
        ))
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    let body = body_json(res).await;
    assert_eq!(body["message"], "Password reset successful");
    assert_eq!(body["data"]["user"]["id"], user.id);
    assert!(body["data"]["token"].is_string());

    // The ticket is single use
    let res = app.send(request(Method::GET, &validate_uri, None, None)).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(res).await["message"],
        "Reset token is invalid or has expired"
    );

    // The old password no longer works, the new one does
    let old = app
        .send(request(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "userName": "alice", "password": TEST_PASSWORD })),
        ))
        .await;
    assert_eq!(old.status(), StatusCode::UNAUTHORIZED);

    let new = app
        .send(request(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "userName": "alice", "password": "brand-new-pass" })),
        ))
        .await;
    assert_eq!(new.status(), StatusCode::OK);

    let subjects: Vec<String> = app.email.sent().into_iter().map(|m| m.subject).collect();
    assert!(subjects.contains(&"CYACC Admin Password Updated".to_string()));
}

#[tokio::test]
async fn test_new_reset_request_replaces_previous_ticket() {
    let app = TestApp::new().await;
    app.seed_user("alice", false).await;

    for _ in 0..2 {
        let res = app
            .send(request(
                Method::POST,
                "/api/auth/forgot-password",
                None,
                Some(json!({ "email": "alice@example.org" })),
            ))
            .await;
        assert_eq!(res.status(), StatusCode::OK);
    }

    let sent = app.email.sent();
    assert_eq!(sent.len(), 2);
    let first = reset_token_from(&sent[0].body);
    let second = reset_token_from(&sent[1].body);
    assert_ne!(first, second);

    let validate = |token: &str| {
        format!(
            "/api/auth/reset-password/validate?token={}&email=alice%40example.org",
            token
        )
    };

    let res = app.send(request(Method::GET, &validate(&first), None, None)).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(res).await["message"],
        "Reset token is invalid or has expired"
    );

    let res = app.send(request(Method::GET, &validate(&second), None, None)).await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_reset_accepts_new_password_alias() {
    let app = TestApp::new().await;
    app.seed_user("alice", false).await;

    app.send(request(
        Method::POST,
        "/api/auth/forgot-password",
        None,
        Some(json!({ "email": "alice@example.org" })),
    ))
    .await;
    let token = reset_token_from(&app.email.sent()[0].body);

    let res = app
        .send(request(
            Method::POST,
            "/api/auth/reset-password",
            None,
            Some(json!({ "token": token, "email": "alice@example.org", "newPassword": "brand-new-pass" })),
        ))
        .await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_validate_without_params_is_invalid_reset_token() {
    let app = TestApp::new().await;

    let res = app
        .send(request(
            Method::GET,
            "/api/auth/reset-password/validate",
            None,
            None,
        ))
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(res).await["message"], "Invalid reset token");
}

#[tokio::test]
async fn test_expired_and_mismatched_tickets_look_the_same() {
    let app = TestApp::new().await;
    let user = app.seed_user("alice", false).await;

    app.send(request(
        Method::POST,
        "/api/auth/forgot-password",
        None,
        Some(json!({ "email": "alice@example.org" })),
    ))
    .await;
    let token = reset_token_from(&app.email.sent()[0].body);

    let wrong_email = app
        .send(request(
            Method::GET,
            &format!(
                "/api/auth/reset-password/validate?token={}&email=bob%40example.org",
                token
            ),
            None,
            None,
        ))
        .await;

    app.store
        .set_reset_expiry(user.id, Utc::now() - Duration::minutes(1))
        .unwrap();
    let expired = app
        .send(request(
            Method::POST,
            "/api/auth/reset-password",
            None,
            Some(json!({ "token": token, "email": "alice@example.org", "password": "brand-new-pass" })),
        ))
        .await;

    assert_eq!(wrong_email.status(), StatusCode::BAD_REQUEST);
    assert_eq!(expired.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(wrong_email).await, body_json(expired).await);

    // Password untouched
    let stored = app.store.find_by_id(user.id).await.unwrap().unwrap();
    assert_eq!(stored.password, user.password);
}

#[tokio::test]
async fn test_auth_routes_are_rate_limited_per_ip() {
    let mut config = test_config();
    config.rate_limit.enabled = true;
    config.rate_limit.auth_max_requests = 2;
    let app = TestApp::with_config(config).await;

    let attempt = || {
        let mut req = request(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "userName": "nobody", "password": "whatever1" })),
        );
        req.headers_mut()
            .insert("x-forwarded-for", "203.0.113.7".parse().unwrap());
        req
    };

    assert_eq!(app.send(attempt()).await.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(app.send(attempt()).await.status(), StatusCode::UNAUTHORIZED);

    let limited = app.send(attempt()).await;
    assert_eq!(limited.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(limited.headers().contains_key("retry-after"));
    assert_eq!(body_json(limited).await["respCode"], 429);

    // Health is outside the credential limiter
    let mut health = request(Method::GET, "/api/health", None, None);
    health
        .headers_mut()
        .insert("x-forwarded-for", "203.0.113.7".parse().unwrap());
    assert_eq!(app.send(health).await.status(), StatusCode::OK);
}
