//! tests/auth/signup.rs

#[path = "../mod.rs"]
mod common;

use reqwest::StatusCode;
use serde_json::json;

#[tokio::test]
async fn sign_up_returns_the_new_user() {
    let app = common::spawn_app();

    let (status, json) = app.sign_up("dev@example.com", Some("octodev")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert_eq!(json["message"], "Sign up completed.");

    let user = &json["data"];
    assert_eq!(user["email"], "dev@example.com");
    assert_eq!(user["developerType"], "BACKEND");
    assert_eq!(user["subscriptionPlan"], "FREE");
    assert_eq!(user["preferredCurrency"], "KRW");
    assert_eq!(user["timezone"], "Asia/Seoul");
    assert_eq!(user["provider"], "local");
    assert_eq!(user["emailVerified"], false);
    assert_eq!(user["githubUsername"], "octodev");
    assert!(user.get("password").is_none());
}

#[tokio::test]
async fn duplicate_email_is_a_bad_request() {
    let app = common::spawn_app();
    app.sign_up("dev@example.com", None).await;

    let (status, json) = app.sign_up("dev@example.com", None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["errorCode"], "BAD_REQUEST");
    assert_eq!(json["message"], "Email is already in use.");
}

#[tokio::test]
async fn taken_github_username_is_checked_before_email() {
    let app = common::spawn_app();
    app.sign_up("dev@example.com", Some("octodev")).await;

    let (status, json) = app.sign_up("dev@example.com", Some("octodev")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["message"], "GitHub username is already in use.");
}

#[tokio::test]
async fn mismatched_confirmation_is_rejected() {
    let app = common::spawn_app();

    let (status, json) = app
        .post_json(
            "/api/v1/auth/signup",
            &json!({
                "email": "dev@example.com",
                "password": "password123!",
                "confirmPassword": "password321!",
                "nickname": "developer",
                "developerType": "FRONTEND"
            }),
            None,
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["errorCode"], "BAD_REQUEST");
}

#[tokio::test]
async fn invalid_fields_are_reported_together() {
    let app = common::spawn_app();

    let (status, json) = app
        .post_json(
            "/api/v1/auth/signup",
            &json!({
                "email": "not-an-email",
                "password": "short",
                "confirmPassword": "short",
                "nickname": "d",
                "developerType": "BACKEND"
            }),
            None,
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["errorCode"], "VALIDATION_ERROR");

    let message = json["message"].as_str().unwrap();
    assert!(message.starts_with("Invalid input: "));
    for field in ["email:", "password:", "nickname:"] {
        assert!(message.contains(field), "{field} missing from {message}");
    }
}

#[tokio::test]
async fn unknown_developer_type_is_a_bind_error() {
    let app = common::spawn_app();

    let (status, json) = app
        .post_json(
            "/api/v1/auth/signup",
            &json!({
                "email": "dev@example.com",
                "password": "password123!",
                "confirmPassword": "password123!",
                "nickname": "developer",
                "developerType": "WIZARD"
            }),
            None,
        )
        .await;

    assert!(status.is_client_error());
    assert_eq!(json["errorCode"], "BIND_ERROR");
}

#[tokio::test]
async fn hourly_rate_must_fit_the_column() {
    let app = common::spawn_app();
    let mut body = json!({
        "email": "dev@example.com",
        "password": common::TEST_PASSWORD,
        "confirmPassword": common::TEST_PASSWORD,
        "nickname": "developer",
        "developerType": "BACKEND",
        "hourlyRate": 123456789012.345_f64
    });

    let (status, json) = app.post_json("/api/v1/auth/signup", &body, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["errorCode"], "VALIDATION_ERROR");
    assert!(json["message"].as_str().unwrap().contains("hourlyRate:"));

    // Extra places are rounded to cents
    body["hourlyRate"] = json!(12.3456_f64);
    let (status, json) = app.post_json("/api/v1/auth/signup", &body, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["hourlyRate"], 12.35);
}
