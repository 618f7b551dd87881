use axum::extract::State;
use tracing::instrument;

use crate::api::extractors::ValidatedJson;
use crate::auth::UserPrincipal;
use crate::config::state::AppState;
use crate::errors::AppError;
use crate::models::requests::UpdateProfileRequest;
use crate::utils::response_handler::{ApiResponse, HandlerResponse};

/// Update the caller's profile; absent fields are left unchanged
#[utoipa::path(
    put,
    path = "/api/v1/users/me",
    tag = "Users",
    security(("bearer-jwt" = [])),
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "data is the updated UserResponse", body = ApiResponse),
        (status = 400, description = "Validation failure or GitHub username taken", body = ApiResponse),
        (status = 401, description = "Missing or invalid access token", body = ApiResponse)
    )
)]
#[instrument(skip_all, fields(user_id = principal.id))]
pub async fn update_profile(
    State(state): State<AppState>,
    principal: UserPrincipal,
    ValidatedJson(request): ValidatedJson<UpdateProfileRequest>,
) -> Result<HandlerResponse, AppError> {
    let user = state.user_service.update_profile(principal.id, request).await?;
    Ok(HandlerResponse::ok(&user)?.message("Profile updated."))
}
