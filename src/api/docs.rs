//! OpenAPI document served at `/v3/api-docs`.

use axum::{routing::get, Json, Router};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::config::state::AppState;
use crate::models::{
    AuthResponse, DeveloperType, DeveloperTypeCount, DeveloperTypeStats, LoginRequest,
    LogoutRequest, RefreshTokenRequest, SignUpRequest, SubscriptionPlan, UpdateProfileRequest,
    UserResponse,
};
use crate::utils::response_handler::ApiResponse;

pub const BEARER_SCHEME: &str = "bearer-jwt";

#[derive(OpenApi)]
#[openapi(
    info(
        title = "DevTracker API",
        version = "1.0",
        description = "DevTracker backend: local and GitHub sign-in, JWT tokens and developer profiles.",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    tags(
        (name = "Authentication", description = "Sign up, sign in, token refresh and logout"),
        (name = "OAuth2", description = "GitHub authorization-code login"),
        (name = "Users", description = "Profile management"),
        (name = "Public", description = "Unauthenticated statistics"),
        (name = "Actuator", description = "Health checks")
    ),
    paths(
        crate::api::auth::handler::sign_up,
        crate::api::auth::handler::sign_in,
        crate::api::auth::handler::refresh_token,
        crate::api::auth::handler::github_login_url,
        crate::api::auth::handler::current_user,
        crate::api::auth::handler::logout,
        crate::api::oauth2::handler::authorize_github,
        crate::api::oauth2::handler::github_callback,
        crate::api::users::handler::update_profile,
        crate::api::public::handler::developer_type_stats,
        crate::api::actuator::handler::health
    ),
    components(schemas(
        ApiResponse,
        SignUpRequest,
        LoginRequest,
        RefreshTokenRequest,
        LogoutRequest,
        UpdateProfileRequest,
        UserResponse,
        AuthResponse,
        DeveloperType,
        SubscriptionPlan,
        DeveloperTypeCount,
        DeveloperTypeStats
    )),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Registers the bearer JWT scheme referenced by protected operations
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                BEARER_SCHEME,
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Access token from /api/v1/auth/signin"))
                        .build(),
                ),
            );
        }
    }
}

async fn api_docs() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

pub fn docs_routes() -> Router<AppState> {
    Router::new().route("/v3/api-docs", get(api_docs))
}
