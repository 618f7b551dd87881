//! tests/auth/refresh.rs

#[path = "../mod.rs"]
mod common;

use reqwest::StatusCode;
use serde_json::json;

#[tokio::test]
async fn refresh_rotates_the_token_pair() {
    let app = common::spawn_app();
    let (_, refresh) = app.signed_in("dev@example.com").await;

    let (status, json) = app
        .post_json("/api/v1/auth/refresh", &json!({ "refreshToken": refresh }), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let rotated = json["data"]["refreshToken"].as_str().unwrap().to_string();
    assert_ne!(rotated, refresh);

    // The old refresh token is spent
    let (status, json) = app
        .post_json("/api/v1/auth/refresh", &json!({ "refreshToken": refresh }), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["errorCode"], "BAD_REQUEST");

    // The rotated one still works
    let (status, _) = app
        .post_json("/api/v1/auth/refresh", &json!({ "refreshToken": rotated }), None)
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn access_token_cannot_be_used_to_refresh() {
    let app = common::spawn_app();
    let (access, _) = app.signed_in("dev@example.com").await;

    let (status, json) = app
        .post_json("/api/v1/auth/refresh", &json!({ "refreshToken": access }), None)
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["message"], "Invalid refresh token.");
}

#[tokio::test]
async fn garbage_and_blank_tokens_are_rejected() {
    let app = common::spawn_app();

    let (status, _) = app
        .post_json("/api/v1/auth/refresh", &json!({ "refreshToken": "garbage" }), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, json) = app
        .post_json("/api/v1/auth/refresh", &json!({ "refreshToken": "" }), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["errorCode"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn refresh_for_unknown_user_is_not_found() {
    let app = common::spawn_app();
    let orphan = app.state.jwt.generate_refresh_token(4242).unwrap();

    let (status, json) = app
        .post_json("/api/v1/auth/refresh", &json!({ "refreshToken": orphan }), None)
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["errorCode"], "RESOURCE_NOT_FOUND");
}
