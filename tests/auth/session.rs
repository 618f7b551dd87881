//! tests/auth/session.rs
//! Protected endpoints: /me and /logout.

#[path = "../mod.rs"]
mod common;

use reqwest::StatusCode;
use serde_json::json;

#[tokio::test]
async fn me_requires_a_token() {
    let app = common::spawn_app();

    let (status, json) = app.get("/api/v1/auth/me", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["errorCode"], "UNAUTHORIZED");

    let (status, _) = app.get("/api/v1/auth/me", Some("not.a.token")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn me_returns_the_caller() {
    let app = common::spawn_app();
    let (access, _) = app.signed_in("dev@example.com").await;

    let (status, json) = app.get("/api/v1/auth/me", Some(&access)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["email"], "dev@example.com");
    assert_eq!(json["data"]["nickname"], "developer");
}

#[tokio::test]
async fn refresh_token_is_not_an_access_token() {
    let app = common::spawn_app();
    let (_, refresh) = app.signed_in("dev@example.com").await;

    let (status, _) = app.get("/api/v1/auth/me", Some(&refresh)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn logout_revokes_access_and_refresh_tokens() {
    let app = common::spawn_app();
    let (access, refresh) = app.signed_in("dev@example.com").await;

    let (status, json) = app
        .post_json("/api/v1/auth/logout", &json!({ "refreshToken": refresh }), Some(&access))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"], "SUCCESS");

    let (status, _) = app.get("/api/v1/auth/me", Some(&access)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .post_json("/api/v1/auth/refresh", &json!({ "refreshToken": refresh }), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn logout_without_body_revokes_the_access_token() {
    let app = common::spawn_app();
    let (access, refresh) = app.signed_in("dev@example.com").await;

    let response = app
        .client
        .post(app.url("/api/v1/auth/logout"))
        .bearer_auth(&access)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let (status, _) = app.get("/api/v1/auth/me", Some(&access)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // The refresh token was not presented, so it stays valid
    let (status, _) = app
        .post_json("/api/v1/auth/refresh", &json!({ "refreshToken": refresh }), None)
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn logout_requires_a_token() {
    let app = common::spawn_app();

    let (status, json) = app.post_json("/api/v1/auth/logout", &json!({}), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["errorCode"], "UNAUTHORIZED");
}
