//! tests/oauth2/github_login.rs

#[path = "../mod.rs"]
mod common;

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, StatusCode as AxumStatus},
    response::IntoResponse,
    routing::{get, post},
    Form, Json, Router,
};
use reqwest::{
    header::{COOKIE, LOCATION, SET_COOKIE},
    StatusCode,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;

const FRONTEND_REDIRECT: &str = "http://localhost:3000/oauth2/redirect";
const GITHUB_ACCESS_TOKEN: &str = "gho_fake";

/// What the fake GitHub answers for `/user` and `/user/emails`.
struct FakeGitHub {
    user: Value,
    emails: Value,
}

async fn access_token(Form(form): Form<HashMap<String, String>>) -> Json<Value> {
    // GitHub answers 200 even for rejected codes
    match form.get("code").map(String::as_str) {
        Some("good-code") => Json(json!({
            "access_token": GITHUB_ACCESS_TOKEN,
            "token_type": "bearer",
            "scope": "read:user,user:email"
        })),
        _ => Json(json!({
            "error": "bad_verification_code",
            "error_description": "The code passed is incorrect or expired."
        })),
    }
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value == format!("Bearer {GITHUB_ACCESS_TOKEN}"))
}

async fn user(State(fake): State<Arc<FakeGitHub>>, headers: HeaderMap) -> impl IntoResponse {
    if !authorized(&headers) {
        return (AxumStatus::UNAUTHORIZED, Json(json!({ "message": "Bad credentials" })));
    }
    (AxumStatus::OK, Json(fake.user.clone()))
}

async fn emails(State(fake): State<Arc<FakeGitHub>>, headers: HeaderMap) -> impl IntoResponse {
    if !authorized(&headers) {
        return (AxumStatus::UNAUTHORIZED, Json(json!({ "message": "Bad credentials" })));
    }
    (AxumStatus::OK, Json(fake.emails.clone()))
}

/// Serves the token and user endpoints on an ephemeral port; returns its base URL.
async fn fake_github(user_json: Value, emails_json: Value) -> String {
    let app = Router::new()
        .route("/login/oauth/access_token", post(access_token))
        .route("/user", get(user))
        .route("/user/emails", get(emails))
        .with_state(Arc::new(FakeGitHub {
            user: user_json,
            emails: emails_json,
        }));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Fake GitHub failed");
    });

    format!("http://{}", addr)
}

fn octocat(email: Option<&str>) -> Value {
    json!({
        "id": 583231,
        "login": "octocat",
        "name": "The Octocat",
        "email": email,
        "avatar_url": "https://avatars.githubusercontent.com/u/583231"
    })
}

fn spawn_with_github(github_url: &str, redirect: Option<&str>) -> common::TestApp {
    let token_url = format!("{github_url}/login/oauth/access_token");
    let mut overrides = vec![
        ("GITHUB_CLIENT_ID", "client-id"),
        ("GITHUB_CLIENT_SECRET", "client-secret"),
        ("GITHUB_TOKEN_URL", token_url.as_str()),
        ("GITHUB_API_URL", github_url),
    ];
    if let Some(uri) = redirect {
        overrides.push(("OAUTH2_AUTHORIZED_REDIRECT_URI", uri));
    }
    common::spawn_app_with(&overrides)
}

/// Follows `/oauth2/authorization/github` and returns the issued state.
/// The state is also set as an HttpOnly cookie scoped to the callback.
async fn authorize(app: &common::TestApp) -> String {
    let response = app
        .client
        .get(app.url("/oauth2/authorization/github"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FOUND);

    let location = response.headers().get(LOCATION).unwrap().to_str().unwrap();
    let url = url::Url::parse(location).unwrap();
    assert_eq!(url.host_str(), Some("github.com"));

    let query: Vec<(String, String)> = url.query_pairs().into_owned().collect();
    let param = |name: &str| {
        query
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.clone())
    };
    assert_eq!(param("client_id").as_deref(), Some("client-id"));
    assert_eq!(param("scope").as_deref(), Some("read:user user:email"));
    let state = param("state").unwrap();

    let cookie = response.headers().get(SET_COOKIE).unwrap().to_str().unwrap();
    assert!(cookie.starts_with(&format!("oauth2_state={state};")), "{cookie}");
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Lax"));
    state
}

/// Callback from the browser that started the flow.
async fn callback(app: &common::TestApp, code: &str, state: &str) -> reqwest::Response {
    let cookie = format!("oauth2_state={state}");
    callback_with_cookie(app, code, state, Some(&cookie)).await
}

async fn callback_with_cookie(
    app: &common::TestApp,
    code: &str,
    state: &str,
    cookie: Option<&str>,
) -> reqwest::Response {
    let mut request = app
        .client
        .get(app.url("/oauth2/callback/github"))
        .query(&[("code", code), ("state", state)]);
    if let Some(cookie) = cookie {
        request = request.header(COOKIE, cookie);
    }
    request.send().await.unwrap()
}

#[tokio::test]
async fn first_login_registers_the_github_user() {
    let github = fake_github(octocat(Some("octocat@github.com")), json!([])).await;
    let app = spawn_with_github(&github, None);

    let state = authorize(&app).await;
    let (status, json) = common::read(callback(&app, "good-code", &state).await).await;

    assert_eq!(status, StatusCode::OK, "{json}");
    let data = &json["data"];
    assert_eq!(data["tokenType"], "Bearer");
    assert_eq!(data["user"]["email"], "octocat@github.com");
    assert_eq!(data["user"]["nickname"], "The Octocat");
    assert_eq!(data["user"]["provider"], "github");
    assert_eq!(data["user"]["githubUsername"], "octocat");
    assert_eq!(data["user"]["developerType"], "OTHER");
    assert_eq!(data["user"]["emailVerified"], true);

    let access = data["accessToken"].as_str().unwrap();
    let (status, me) = app.get("/api/v1/auth/me", Some(access)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["data"]["email"], "octocat@github.com");
}

#[tokio::test]
async fn missing_public_email_falls_back_to_primary_verified_address() {
    let emails = json!([
        { "email": "old@example.com", "primary": false, "verified": true },
        { "email": "primary@example.com", "primary": true, "verified": true }
    ]);
    let github = fake_github(octocat(None), emails).await;
    let app = spawn_with_github(&github, None);

    let state = authorize(&app).await;
    let (status, json) = common::read(callback(&app, "good-code", &state).await).await;

    assert_eq!(status, StatusCode::OK, "{json}");
    assert_eq!(json["data"]["user"]["email"], "primary@example.com");
}

#[tokio::test]
async fn state_is_single_use() {
    let github = fake_github(octocat(Some("octocat@github.com")), json!([])).await;
    let app = spawn_with_github(&github, None);

    let state = authorize(&app).await;
    let (status, _) = common::read(callback(&app, "good-code", &state).await).await;
    assert_eq!(status, StatusCode::OK);

    let (status, json) = common::read(callback(&app, "good-code", &state).await).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["errorCode"], "OAUTH2_AUTHENTICATION_ERROR");
    assert_eq!(json["message"], "Invalid or expired OAuth2 state.");
}

#[tokio::test]
async fn state_from_another_browser_is_rejected() {
    let github = fake_github(octocat(Some("octocat@github.com")), json!([])).await;
    let app = spawn_with_github(&github, None);

    // A valid state presented without its cookie, e.g. a forwarded callback link
    let state = authorize(&app).await;
    let (status, json) = common::read(callback_with_cookie(&app, "good-code", &state, None).await).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["errorCode"], "OAUTH2_AUTHENTICATION_ERROR");
    assert_eq!(json["message"], "Invalid or expired OAuth2 state.");

    // Or with the cookie of a different flow
    let other = authorize(&app).await;
    let cookie = format!("oauth2_state={other}");
    let (status, _) = common::read(
        callback_with_cookie(&app, "good-code", &state, Some(&cookie)).await,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // The mismatch does not burn the state for its own browser
    let (status, _) = common::read(callback(&app, "good-code", &state).await).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn callback_clears_the_state_cookie() {
    let github = fake_github(octocat(Some("octocat@github.com")), json!([])).await;
    let app = spawn_with_github(&github, None);

    let state = authorize(&app).await;
    let response = callback(&app, "good-code", &state).await;
    let cookie = response.headers().get(SET_COOKIE).unwrap().to_str().unwrap();
    assert!(cookie.starts_with("oauth2_state=;"), "{cookie}");
    assert!(cookie.contains("Max-Age=0"));
}

#[tokio::test]
async fn rejected_code_is_an_oauth2_error() {
    let github = fake_github(octocat(Some("octocat@github.com")), json!([])).await;
    let app = spawn_with_github(&github, None);

    let state = authorize(&app).await;
    let (status, json) = common::read(callback(&app, "bad-code", &state).await).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["errorCode"], "OAUTH2_AUTHENTICATION_ERROR");
    assert_eq!(json["message"], "Failed to complete GitHub login.");
}

#[tokio::test]
async fn local_account_cannot_sign_in_with_github() {
    let github = fake_github(octocat(Some("octocat@github.com")), json!([])).await;
    let app = spawn_with_github(&github, None);
    app.sign_up("octocat@github.com", None).await;

    let state = authorize(&app).await;
    let (status, json) = common::read(callback(&app, "good-code", &state).await).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(json["message"].as_str().unwrap().contains("local"));
}

#[tokio::test]
async fn redirect_uri_receives_tokens_or_error() {
    let github = fake_github(octocat(Some("octocat@github.com")), json!([])).await;
    let app = spawn_with_github(&github, Some(FRONTEND_REDIRECT));

    let state = authorize(&app).await;
    let response = callback(&app, "good-code", &state).await;
    assert_eq!(response.status(), StatusCode::FOUND);

    let location = response.headers().get(LOCATION).unwrap().to_str().unwrap();
    assert!(location.starts_with(FRONTEND_REDIRECT));
    let url = url::Url::parse(location).unwrap();
    let access = url
        .query_pairs()
        .find(|(key, _)| key == "accessToken")
        .map(|(_, value)| value.into_owned())
        .unwrap();
    assert!(app.state.jwt.decode(&access).unwrap().is_access());
    assert!(url.query_pairs().any(|(key, _)| key == "refreshToken"));

    // Replayed state is reported to the frontend instead
    let response = callback(&app, "good-code", &state).await;
    assert_eq!(response.status(), StatusCode::FOUND);
    let location = response.headers().get(LOCATION).unwrap().to_str().unwrap();
    let url = url::Url::parse(location).unwrap();
    assert!(url.query_pairs().any(|(key, _)| key == "error"));
    assert!(!url.query_pairs().any(|(key, _)| key == "accessToken"));
}

#[tokio::test]
async fn unconfigured_github_login_is_refused() {
    let app = common::spawn_app();

    let (status, json) = app.get("/oauth2/authorization/github", None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["message"], "GitHub login is not configured.");
}
