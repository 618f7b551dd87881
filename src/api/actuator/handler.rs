// Liveness/readiness of the service and its backing stores

use axum::{extract::State, http::StatusCode};
use serde_json::{json, Value};
use tracing::{instrument, warn};

use crate::config::state::AppState;
use crate::utils::response_handler::{ApiResponse, HandlerResponse};

const STATUS_UP: &str = "UP";
const STATUS_DOWN: &str = "DOWN";

fn component(result: anyhow::Result<()>, name: &str) -> Value {
    match result {
        Ok(()) => json!({ "status": STATUS_UP }),
        Err(err) => {
            warn!("Health check for {} failed: {:#}", name, err);
            json!({ "status": STATUS_DOWN })
        }
    }
}

/// Identifies the instance answering the health check
fn instance_identifier() -> String {
    hostname::get()
        .ok()
        .and_then(|name| name.into_string().ok())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Reports UP only when the user store and the auth cache both answer
#[utoipa::path(
    get,
    path = "/actuator/health",
    tag = "Actuator",
    responses(
        (status = 200, description = "All components are up", body = ApiResponse),
        (status = 503, description = "At least one component is down", body = ApiResponse)
    )
)]
#[instrument(skip_all)]
pub async fn health(State(state): State<AppState>) -> HandlerResponse {
    let (db, redis) = tokio::join!(state.users.ping(), state.cache.ping());
    let db = component(db, "db");
    let redis = component(redis, "redis");

    let all_up = db["status"] == STATUS_UP && redis["status"] == STATUS_UP;
    let (status_code, status) = if all_up {
        (StatusCode::OK, STATUS_UP)
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, STATUS_DOWN)
    };

    HandlerResponse::new(status_code)
        .data(json!({
            "status": status,
            "instance": instance_identifier(),
            "components": { "db": db, "redis": redis }
        }))
        .message(format!("Service is {status}"))
}
