use axum::{extract::FromRequestParts, http::request::Parts};

use crate::errors::AppError;
use crate::models::claims::Claims;

pub const ROLE_USER: &str = "ROLE_USER";

/// Authenticated caller, built from access token claims without a database read.
#[derive(Debug, Clone, PartialEq)]
pub struct UserPrincipal {
    pub id: i64,
    pub email: Option<String>,
    pub nickname: Option<String>,
    pub role: &'static str,
    /// `jti` of the presenting token, used to revoke it on logout
    pub token_id: String,
    /// Unix seconds
    pub token_expires_at: i64,
}

impl UserPrincipal {
    /// `None` unless the claims belong to an access token with a numeric subject.
    pub fn from_claims(claims: Claims) -> Option<Self> {
        if !claims.is_access() {
            return None;
        }
        let id = claims.user_id()?;

        Some(Self {
            id,
            email: claims.email,
            nickname: claims.nickname,
            role: ROLE_USER,
            token_id: claims.jti,
            token_expires_at: claims.exp,
        })
    }
}

/// Protected handlers take a `UserPrincipal` argument; requests without one get 401.
impl<S> FromRequestParts<S> for UserPrincipal
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<UserPrincipal>()
            .cloned()
            .ok_or(AppError::Unauthorized)
    }
}
