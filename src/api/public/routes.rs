use axum::{routing::get, Router};

use crate::config::state::AppState;
use super::handler;

/// Endpoints that never require authentication
pub fn public_routes() -> Router<AppState> {
    Router::new().route(
        "/api/v1/public/stats/developer-types",
        get(handler::developer_type_stats),
    )
}
