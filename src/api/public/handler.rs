use axum::extract::State;
use tracing::{info, instrument};

use crate::config::state::AppState;
use crate::errors::AppError;
use crate::utils::response_handler::{ApiResponse, HandlerResponse};

/// Number of registered users per developer type
#[utoipa::path(
    get,
    path = "/api/v1/public/stats/developer-types",
    tag = "Public",
    responses((status = 200, description = "data is DeveloperTypeStats", body = ApiResponse))
)]
#[instrument(skip_all)]
pub async fn developer_type_stats(State(state): State<AppState>) -> Result<HandlerResponse, AppError> {
    let stats = state.user_service.developer_type_stats().await?;
    info!(total = stats.total, "Developer type stats computed");
    Ok(HandlerResponse::ok(&stats)?.message("Developer type statistics retrieved."))
}
