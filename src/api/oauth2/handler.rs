// GitHub OAuth2 authorization-code flow

use axum::{
    extract::{Query, State},
    http::{
        header::{COOKIE, LOCATION, SET_COOKIE},
        HeaderMap, HeaderValue, StatusCode,
    },
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tracing::{error, info, instrument, warn};
use utoipa::IntoParams;

use crate::config::state::AppState;
use crate::errors::AppError;
use crate::models::responses::AuthResponse;
use crate::models::user::PROVIDER_GITHUB;
use crate::utils::response_handler::{ApiResponse, HandlerResponse};

pub const MSG_OAUTH2_NOT_CONFIGURED: &str = "GitHub login is not configured.";
pub const MSG_INVALID_STATE: &str = "Invalid or expired OAuth2 state.";
pub const MSG_GITHUB_EXCHANGE_FAILED: &str = "Failed to complete GitHub login.";

/// Binds the authorization `state` to the browser that started the flow
pub const STATE_COOKIE: &str = "oauth2_state";
const STATE_COOKIE_PATH: &str = "/oauth2/callback";
/// Matches the server-side state lifetime
const STATE_COOKIE_MAX_AGE_SECONDS: u64 = 600;

#[derive(Debug, Deserialize, IntoParams)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    /// Set by GitHub when the user denies access
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// 302 with a `Location` header.
fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(LOCATION, location.to_string())]).into_response()
}

/// Redirect to GitHub's authorize page
#[utoipa::path(
    get,
    path = "/oauth2/authorization/github",
    tag = "OAuth2",
    responses(
        (status = 302, description = "Redirect to GitHub"),
        (status = 401, description = "GitHub login is not configured", body = ApiResponse)
    )
)]
#[instrument(skip_all)]
pub async fn authorize_github(State(state): State<AppState>) -> Result<Response, AppError> {
    if !state.github.is_enabled() {
        return Err(AppError::oauth2(MSG_OAUTH2_NOT_CONFIGURED));
    }

    let request = state.github.authorization_url().await?;
    let mut response = found(&request.url);
    let cookie = state_cookie(&request.state, STATE_COOKIE_MAX_AGE_SECONDS, is_secure(&state));
    response.headers_mut().append(SET_COOKIE, cookie?);
    Ok(response)
}

/// GitHub redirects back here with `code` and `state`
#[utoipa::path(
    get,
    path = "/oauth2/callback/github",
    tag = "OAuth2",
    params(CallbackParams),
    responses(
        (status = 200, description = "Signed in, data is an AuthResponse (no redirect URI configured)", body = ApiResponse),
        (status = 302, description = "Redirect to the frontend with tokens or an error"),
        (status = 401, description = "OAuth2 processing failed", body = ApiResponse)
    )
)]
#[instrument(skip_all)]
pub async fn github_callback(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<CallbackParams>,
) -> Response {
    let mut response = callback_response(&state, params, cookie_value(&headers, STATE_COOKIE)).await;

    // The state cookie is single use whatever the outcome
    match state_cookie("", 0, is_secure(&state)) {
        Ok(expired) => {
            response.headers_mut().append(SET_COOKIE, expired);
        }
        Err(err) => warn!("Failed to clear OAuth2 state cookie: {}", err),
    }
    response
}

async fn callback_response(
    state: &AppState,
    params: CallbackParams,
    browser_state: Option<&str>,
) -> Response {
    let redirect_uri = state.environment.oauth2_authorized_redirect_uri.clone();

    match complete_login(state, params, browser_state).await {
        Ok(auth) => {
            info!(user_id = auth.user.id, "GitHub login succeeded");
            match redirect_uri {
                Some(uri) => redirect_with(
                    &uri,
                    &[
                        ("accessToken", auth.access_token.as_str()),
                        ("refreshToken", auth.refresh_token.as_str()),
                    ],
                ),
                None => HandlerResponse::ok(&auth)
                    .map(|response| response.message("Signed in with GitHub."))
                    .into_response(),
            }
        }
        Err(err) => match redirect_uri {
            Some(uri) => {
                warn!("GitHub login failed: {}", err);
                redirect_with(&uri, &[("error", err.client_message().as_str())])
            }
            None => err.into_response(),
        },
    }
}

async fn complete_login(
    state: &AppState,
    params: CallbackParams,
    browser_state: Option<&str>,
) -> Result<AuthResponse, AppError> {
    if let Some(error) = params.error {
        return Err(AppError::oauth2(params.error_description.unwrap_or(error)));
    }

    let oauth_state = params.state.unwrap_or_default();
    if oauth_state.is_empty() || browser_state != Some(oauth_state.as_str()) {
        warn!("OAuth2 state does not match the state cookie");
        return Err(AppError::oauth2(MSG_INVALID_STATE));
    }
    if !state.github.consume_state(&oauth_state).await {
        return Err(AppError::oauth2(MSG_INVALID_STATE));
    }

    let code = params
        .code
        .filter(|code| !code.is_empty())
        .ok_or_else(|| AppError::oauth2("Authorization code is missing."))?;

    let access_token = state.github.exchange_code(&code).await.map_err(|err| {
        error!("GitHub code exchange failed: {:#}", err);
        AppError::oauth2(MSG_GITHUB_EXCHANGE_FAILED)
    })?;

    let attributes = state
        .github
        .fetch_user_attributes(&access_token)
        .await
        .map_err(|err| {
            error!("Loading GitHub user failed: {:#}", err);
            AppError::oauth2(MSG_GITHUB_EXCHANGE_FAILED)
        })?;

    let user = state
        .oauth2_user_service
        .process_oauth2_user(PROVIDER_GITHUB, attributes)
        .await?;

    state.auth_service.issue_tokens(&user)
}

fn is_secure(state: &AppState) -> bool {
    state.environment.protocol == "https"
}

/// `Set-Cookie` value for the state cookie; a zero max age deletes it.
fn state_cookie(value: &str, max_age_seconds: u64, secure: bool) -> Result<HeaderValue, AppError> {
    let mut cookie = format!(
        "{STATE_COOKIE}={value}; Path={STATE_COOKIE_PATH}; Max-Age={max_age_seconds}; HttpOnly; SameSite=Lax"
    );
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
        .map_err(|err| AppError::Internal(anyhow::anyhow!("invalid state cookie: {err}")))
}

/// Value of a named cookie from the `Cookie` request headers.
fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
}

/// Appends query parameters to the configured frontend URI.
fn redirect_with(uri: &str, pairs: &[(&str, &str)]) -> Response {
    match url::Url::parse(uri) {
        Ok(mut url) => {
            url.query_pairs_mut().extend_pairs(pairs.iter().copied());
            found(url.as_str())
        }
        Err(err) => {
            error!("OAUTH2_AUTHORIZED_REDIRECT_URI is not a valid URL: {}", err);
            AppError::Internal(anyhow::anyhow!("invalid redirect uri")).into_response()
        }
    }
}
