use axum::{routing::get, Router};

use crate::config::state::AppState;
use super::handler;

pub fn actuator_routes() -> Router<AppState> {
    Router::new().route("/actuator/health", get(handler::health))
}
