//! tests/api/actuator.rs

#[path = "../mod.rs"]
mod common;

use reqwest::StatusCode;

#[tokio::test]
async fn health_reports_every_component_up() {
    let app = common::spawn_app();

    let (status, json) = app.get("/actuator/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert_eq!(json["data"]["status"], "UP");
    assert_eq!(json["data"]["components"]["db"]["status"], "UP");
    assert_eq!(json["data"]["components"]["redis"]["status"], "UP");
    assert!(json["data"]["instance"].is_string());
}
