//! tests/global_errors/405.rs
//! Ensures that a known path with the wrong method is enveloped as 405.

#[path = "../mod.rs"]
mod common;

use reqwest::StatusCode;

#[tokio::test]
async fn returns_405_for_wrong_method() {
    let app = common::spawn_app();

    let (status, json) = app.get("/api/v1/auth/signin", None).await;

    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(json["success"], false);
    assert_eq!(json["errorCode"], "METHOD_NOT_ALLOWED");
}
