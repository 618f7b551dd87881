use axum::{routing::get, Router};

use crate::config::state::AppState;
use super::handler;

pub fn oauth2_routes() -> Router<AppState> {
    Router::new()
        .route("/oauth2/authorization/github", get(handler::authorize_github))
        .route("/oauth2/callback/github", get(handler::github_callback))
}
