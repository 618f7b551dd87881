// Bearer token filter: attaches a UserPrincipal to requests carrying a valid access token

use axum::{
    body::Body,
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use tracing::{debug, error, warn};

use crate::auth::jwt::log_validation_failure;
use crate::auth::principal::UserPrincipal;
use crate::config::state::AppState;

const BEARER_PREFIX: &str = "Bearer ";

/// Token from `Authorization: Bearer <jwt>`, if any.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix(BEARER_PREFIX))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Never rejects by itself. Invalid, revoked or refresh tokens leave the
/// request anonymous; protected handlers answer 401 through the extractor.
pub async fn jwt_filter(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(principal) = authenticate(&state, req.headers()).await {
        req.extensions_mut().insert(principal);
    }
    next.run(req).await
}

async fn authenticate(state: &AppState, headers: &HeaderMap) -> Option<UserPrincipal> {
    let token = bearer_token(headers)?;

    let claims = match state.jwt.decode(token) {
        Ok(claims) => claims,
        Err(err) => {
            log_validation_failure(&err);
            return None;
        }
    };

    let Some(principal) = UserPrincipal::from_claims(claims) else {
        warn!("Bearer token is not an access token");
        return None;
    };

    // Revocation check fails closed
    match state.cache.is_token_revoked(&principal.token_id).await {
        Ok(false) => {
            debug!(user_id = principal.id, "Authenticated request");
            Some(principal)
        }
        Ok(true) => {
            debug!(user_id = principal.id, "Rejected revoked token");
            None
        }
        Err(err) => {
            error!("Token revocation lookup failed: {:#}", err);
            None
        }
    }
}
