use axum::{
    routing::{get, post},
    Router,
};

use crate::config::state::AppState;
use super::handler;

/// Public and protected authentication endpoints
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/api/v1/auth/signup", post(handler::sign_up))
        .route("/api/v1/auth/signin", post(handler::sign_in))
        .route("/api/v1/auth/refresh", post(handler::refresh_token))
        .route("/api/v1/auth/oauth2/github", get(handler::github_login_url))
        // Protected: handlers require a UserPrincipal
        .route("/api/v1/auth/me", get(handler::current_user))
        .route("/api/v1/auth/logout", post(handler::logout))
}
