//! tests/global_errors/404.rs
//! Ensures that hitting an unknown route returns HTTP 404 in the standard envelope.

// Include the helper module defined in tests/mod.rs.
#[path = "../mod.rs"]
mod common;

use reqwest::StatusCode;

#[tokio::test]
async fn returns_404_for_nonexistent_route() {
    let app = common::spawn_app();

    let (status, json) = app.get("/does-not-exist", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["success"], false);
    assert_eq!(json["errorCode"], "NOT_FOUND");
    assert!(json["timestamp"].is_string());
}

#[tokio::test]
async fn returns_404_for_unknown_route_even_with_a_valid_token() {
    let app = common::spawn_app();
    let (access, _) = app.signed_in("dev@example.com").await;

    let (status, json) = app.get("/api/v1/nothing-here", Some(&access)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["errorCode"], "NOT_FOUND");
}
