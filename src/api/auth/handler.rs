// Authentication endpoints under /api/v1/auth

use axum::extract::State;
use tracing::{info, instrument};

use crate::api::extractors::{OptionalJson, ValidatedJson};
use crate::auth::UserPrincipal;
use crate::config::state::AppState;
use crate::errors::AppError;
use crate::models::requests::{LoginRequest, LogoutRequest, RefreshTokenRequest, SignUpRequest};
use crate::utils::response_handler::{ApiResponse, HandlerResponse};

pub const GITHUB_AUTHORIZATION_PATH: &str = "/oauth2/authorization/github";
pub const LOGOUT_RESULT: &str = "SUCCESS";

/// Register a local account
#[utoipa::path(
    post,
    path = "/api/v1/auth/signup",
    tag = "Authentication",
    request_body = SignUpRequest,
    responses(
        (status = 200, description = "Sign up completed, data is a UserResponse", body = ApiResponse),
        (status = 400, description = "Validation failure or duplicate email/GitHub username", body = ApiResponse)
    )
)]
#[instrument(skip_all)]
pub async fn sign_up(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<SignUpRequest>,
) -> Result<HandlerResponse, AppError> {
    let user = state.auth_service.sign_up(request).await?;
    Ok(HandlerResponse::ok(&user)?.message("Sign up completed."))
}

/// Exchange email and password for a token pair
#[utoipa::path(
    post,
    path = "/api/v1/auth/signin",
    tag = "Authentication",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in, data is an AuthResponse", body = ApiResponse),
        (status = 401, description = "Invalid email or password", body = ApiResponse)
    )
)]
#[instrument(skip_all)]
pub async fn sign_in(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> Result<HandlerResponse, AppError> {
    let auth = state.auth_service.sign_in(request).await?;
    Ok(HandlerResponse::ok(&auth)?.message("Signed in successfully."))
}

/// Rotate a refresh token into a new token pair
#[utoipa::path(
    post,
    path = "/api/v1/auth/refresh",
    tag = "Authentication",
    request_body = RefreshTokenRequest,
    responses(
        (status = 200, description = "New token pair, data is an AuthResponse", body = ApiResponse),
        (status = 400, description = "Invalid, expired or revoked refresh token", body = ApiResponse),
        (status = 404, description = "User no longer exists", body = ApiResponse)
    )
)]
#[instrument(skip_all)]
pub async fn refresh_token(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<RefreshTokenRequest>,
) -> Result<HandlerResponse, AppError> {
    let auth = state.auth_service.refresh(request).await?;
    Ok(HandlerResponse::ok(&auth)?.message("Token refreshed successfully."))
}

/// Where the client should navigate to start GitHub login
#[utoipa::path(
    get,
    path = "/api/v1/auth/oauth2/github",
    tag = "Authentication",
    responses((status = 200, description = "data is the authorization path", body = ApiResponse))
)]
pub async fn github_login_url() -> Result<HandlerResponse, AppError> {
    Ok(HandlerResponse::ok(&GITHUB_AUTHORIZATION_PATH)?.message("Navigate to this URL to sign in with GitHub."))
}

/// Current user profile
#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    tag = "Authentication",
    security(("bearer-jwt" = [])),
    responses(
        (status = 200, description = "data is a UserResponse", body = ApiResponse),
        (status = 401, description = "Missing or invalid access token", body = ApiResponse)
    )
)]
#[instrument(skip_all, fields(user_id = principal.id))]
pub async fn current_user(
    State(state): State<AppState>,
    principal: UserPrincipal,
) -> Result<HandlerResponse, AppError> {
    let user = state.auth_service.current_user(&principal).await?;
    Ok(HandlerResponse::ok(&user)?.message("User retrieved."))
}

/// Revoke the presenting access token and, optionally, a refresh token
#[utoipa::path(
    post,
    path = "/api/v1/auth/logout",
    tag = "Authentication",
    security(("bearer-jwt" = [])),
    request_body(content = LogoutRequest, description = "Optional; a refresh token to revoke"),
    responses(
        (status = 200, description = "data is SUCCESS", body = ApiResponse),
        (status = 401, description = "Missing or invalid access token", body = ApiResponse)
    )
)]
#[instrument(skip_all, fields(user_id = principal.id))]
pub async fn logout(
    State(state): State<AppState>,
    principal: UserPrincipal,
    OptionalJson(request): OptionalJson<LogoutRequest>,
) -> Result<HandlerResponse, AppError> {
    state.auth_service.logout(&principal, request).await?;
    info!("Logout completed");
    Ok(HandlerResponse::ok(&LOGOUT_RESULT)?.message("Logged out successfully."))
}
