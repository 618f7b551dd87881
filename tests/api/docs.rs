//! tests/api/docs.rs

#[path = "../mod.rs"]
mod common;

use reqwest::StatusCode;

#[tokio::test]
async fn api_document_is_served_without_the_envelope() {
    let app = common::spawn_app();

    let (status, json) = app.get("/v3/api-docs", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["info"]["title"], "DevTracker API");
    assert!(json.get("success").is_none());
    assert!(json["paths"]["/api/v1/auth/signin"]["post"].is_object());
    assert!(json["components"]["securitySchemes"]["bearer-jwt"].is_object());
}
