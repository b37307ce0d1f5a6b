mod common;

use common::TestApp;
use reqwest::header::WWW_AUTHENTICATE;
use reqwest::StatusCode;
use serde_json::json;

/// Flip one character in the middle of the signature segment.
fn tamper(token: &str) -> String {
    let mut chars: Vec<char> = token.chars().collect();
    let index = chars.len() - 5;
    chars[index] = if chars[index] == 'A' { 'B' } else { 'A' };
    chars.into_iter().collect()
}

#[tokio::test]
async fn test_health() {
    let app = TestApp::spawn().await;

    let response = app
        .get("/health")
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::OK);

    let body: serde_json::Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["data"]["status"], "OK");
}

#[tokio::test]
async fn test_register_success() {
    let app = TestApp::spawn().await;

    let response = app
        .post("/api/auth/register")
        .json(&json!({
            "username": "alice",
            "email": "Alice@X.com",
            "password": "secret1"
        }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::CREATED);

    let body: serde_json::Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status_code"], 201);
    assert!(body["data"]["token"].is_string());
    assert_eq!(body["data"]["account"]["username"], "alice");
    assert_eq!(body["data"]["account"]["email"], "alice@x.com");
    assert_eq!(body["data"]["account"]["role"], "user");
    assert!(body["data"]["account"]["id"].is_string());
    assert!(body["data"]["account"]["password_hash"].is_null());
}

#[tokio::test]
async fn test_register_duplicate_username() {
    let app = TestApp::spawn().await;
    app.register("alice", "alice@x.com", "secret1").await;

    let response = app
        .post("/api/auth/register")
        .json(&json!({
            "username": "alice",
            "email": "bob@x.com",
            "password": "secret2"
        }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::CONFLICT);

    let body: serde_json::Value = response.json().await.expect("Failed to parse response");
    assert!(body["data"]["message"]
        .as_str()
        .unwrap()
        .contains("already exists"));
}

#[tokio::test]
async fn test_register_duplicate_email_any_case() {
    let app = TestApp::spawn().await;
    app.register("alice", "alice@x.com", "secret1").await;

    let response = app
        .post("/api/auth/register")
        .json(&json!({
            "username": "bob",
            "email": "ALICE@x.com",
            "password": "secret2"
        }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_register_validation_errors() {
    let app = TestApp::spawn().await;

    let cases = [
        json!({ "username": "al", "email": "alice@x.com", "password": "secret1" }),
        json!({ "username": "alice", "email": "not-an-email", "password": "secret1" }),
        json!({ "username": "alice", "email": "alice@x.com", "password": "short" }),
    ];

    for case in cases {
        let response = app
            .post("/api/auth/register")
            .json(&case)
            .send()
            .await
            .expect("Failed to execute request");

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}

#[tokio::test]
async fn test_login_success() {
    let app = TestApp::spawn().await;
    app.register("alice", "alice@x.com", "secret1").await;

    let response = app
        .post("/api/auth/login")
        .json(&json!({
            "email": "ALICE@x.com",
            "password": "secret1"
        }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::OK);

    let body: serde_json::Value = response.json().await.expect("Failed to parse response");
    let token = body["data"]["token"].as_str().unwrap();
    let claims = app.jwt_handler.verify(token).expect("Token should verify");
    assert_eq!(claims.subject(), body["data"]["account"]["id"].as_str().unwrap());
}

#[tokio::test]
async fn test_login_failures_are_indistinguishable() {
    let app = TestApp::spawn().await;
    app.register("alice", "alice@x.com", "secret1").await;

    let wrong_password = app
        .post("/api/auth/login")
        .json(&json!({ "email": "alice@x.com", "password": "wrong-pw" }))
        .send()
        .await
        .expect("Failed to execute request");
    let unknown_email = app
        .post("/api/auth/login")
        .json(&json!({ "email": "nobody@x.com", "password": "secret1" }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_email.status(), StatusCode::UNAUTHORIZED);

    let wrong_password: serde_json::Value = wrong_password.json().await.unwrap();
    let unknown_email: serde_json::Value = unknown_email.json().await.unwrap();
    assert_eq!(wrong_password["data"]["message"], "Invalid credentials");
    assert_eq!(wrong_password, unknown_email);
}

#[tokio::test]
async fn test_profile_requires_token() {
    let app = TestApp::spawn().await;

    let response = app
        .get("/api/users/profile")
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let challenge = response.headers()[WWW_AUTHENTICATE].to_str().unwrap();
    assert!(challenge.starts_with("Bearer"));
    assert!(!challenge.contains("error="));
}

#[tokio::test]
async fn test_profile_with_token() {
    let app = TestApp::spawn().await;
    let token = app.register("alice", "alice@x.com", "secret1").await;

    let response = app
        .get_authenticated("/api/users/profile", &token)
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::OK);

    let body: serde_json::Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["data"]["username"], "alice");
    assert_eq!(body["data"]["email"], "alice@x.com");
}

#[tokio::test]
async fn test_profile_rejects_tampered_token() {
    let app = TestApp::spawn().await;
    let token = app.register("alice", "alice@x.com", "secret1").await;

    let response = app
        .get_authenticated("/api/users/profile", &tamper(&token))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let challenge = response.headers()[WWW_AUTHENTICATE].to_str().unwrap();
    assert!(challenge.contains(r#"error="invalid_token""#));
}

#[tokio::test]
async fn test_profile_rejects_expired_token() {
    let app = TestApp::spawn().await;
    let token = app.register("alice", "alice@x.com", "secret1").await;
    let account_id = app.jwt_handler.verify(&token).unwrap().subject().to_string();

    let expired = app
        .jwt_handler
        .issue(account_id, chrono::Duration::seconds(-60))
        .unwrap();

    let response = app
        .get_authenticated("/api/users/profile", &expired)
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_update_profile() {
    let app = TestApp::spawn().await;
    let token = app.register("alice", "alice@x.com", "secret1").await;
    app.register("bob", "bob@x.com", "secret2").await;

    let response = app
        .put_authenticated("/api/users/profile", &token)
        .json(&json!({ "username": "alice_2" }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::OK);

    let body: serde_json::Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["data"]["username"], "alice_2");
    assert_eq!(body["data"]["email"], "alice@x.com");

    let taken = app
        .put_authenticated("/api/users/profile", &token)
        .json(&json!({ "email": "bob@x.com" }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(taken.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_change_password() {
    let app = TestApp::spawn().await;
    let token = app.register("alice", "alice@x.com", "secret1").await;

    let wrong_current = app
        .put_authenticated("/api/users/password", &token)
        .json(&json!({ "current_password": "nope-nope", "new_password": "secret2" }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(wrong_current.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .put_authenticated("/api/users/password", &token)
        .json(&json!({ "current_password": "secret1", "new_password": "secret2" }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::OK);

    let old_login = app
        .post("/api/auth/login")
        .json(&json!({ "email": "alice@x.com", "password": "secret1" }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(old_login.status(), StatusCode::UNAUTHORIZED);

    let new_login = app
        .post("/api/auth/login")
        .json(&json!({ "email": "alice@x.com", "password": "secret2" }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(new_login.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_refresh() {
    let app = TestApp::spawn().await;
    let token = app.register("alice", "alice@x.com", "secret1").await;

    let response = app
        .post_authenticated("/api/auth/refresh", &token)
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::OK);

    let body: serde_json::Value = response.json().await.expect("Failed to parse response");
    let refreshed = body["data"]["token"].as_str().unwrap();
    let profile = app
        .get_authenticated("/api/users/profile", refreshed)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(profile.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_refresh_rejects_missing_and_invalid_tokens() {
    let app = TestApp::spawn().await;

    let missing = app
        .post("/api/auth/refresh")
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);

    let invalid = app
        .post_authenticated("/api/auth/refresh", "not.a.token")
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(invalid.status(), StatusCode::UNAUTHORIZED);

    let body: serde_json::Value = invalid.json().await.expect("Failed to parse response");
    assert_eq!(body["data"]["message"], "Invalid token");
}

#[tokio::test]
async fn test_refresh_for_unknown_account() {
    let app = TestApp::spawn().await;
    let orphan = app
        .jwt_handler
        .issue(uuid::Uuid::new_v4(), chrono::Duration::hours(1))
        .unwrap();

    let response = app
        .post_authenticated("/api/auth/refresh", &orphan)
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout() {
    let app = TestApp::spawn().await;

    let response = app
        .post("/api/auth/logout")
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::OK);

    let body: serde_json::Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["data"]["message"], "Logout successful");
}
