use axum::{routing::put, Router};

use crate::config::state::AppState;
use super::handler;

pub fn user_routes() -> Router<AppState> {
    Router::new().route("/api/v1/users/me", put(handler::update_profile))
}
