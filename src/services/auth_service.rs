// Email/password registration, sign-in, token refresh, current user and logout

use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{info, instrument, warn};

use crate::auth::{JwtTokenProvider, PasswordEncoder, UserPrincipal};
use crate::database::{AuthCache, DuplicateEmail, UserRepository};
use crate::errors::{AppError, MSG_USER_NOT_FOUND};
use crate::models::requests::{LoginRequest, LogoutRequest, RefreshTokenRequest, SignUpRequest};
use crate::models::responses::{AuthResponse, UserResponse, TOKEN_TYPE_BEARER};
use crate::models::user::{normalize_hourly_rate, NewUser, User, PROVIDER_LOCAL};

pub const MSG_EMAIL_TAKEN: &str = "Email is already in use.";
pub const MSG_GITHUB_USERNAME_TAKEN: &str = "GitHub username is already in use.";
pub const MSG_PASSWORD_MISMATCH: &str = "Password and password confirmation do not match.";
pub const MSG_NEGATIVE_HOURLY_RATE: &str = "Hourly rate must be zero or greater.";
pub const MSG_INVALID_REFRESH_TOKEN: &str = "Invalid refresh token.";

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    cache: Arc<dyn AuthCache>,
    jwt: JwtTokenProvider,
    passwords: PasswordEncoder,
    user_cache_ttl_seconds: u64,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        cache: Arc<dyn AuthCache>,
        jwt: JwtTokenProvider,
        passwords: PasswordEncoder,
        user_cache_ttl_seconds: u64,
    ) -> Self {
        Self {
            users,
            cache,
            jwt,
            passwords,
            user_cache_ttl_seconds,
        }
    }

    /// Registers a local account. Field validation has already run.
    #[instrument(skip_all, fields(email = %request.email))]
    pub async fn sign_up(&self, request: SignUpRequest) -> Result<UserResponse, AppError> {
        if request.hourly_rate.is_some_and(|rate| rate < Decimal::ZERO) {
            return Err(AppError::bad_request(MSG_NEGATIVE_HOURLY_RATE));
        }

        let github_username = request
            .github_username
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string);

        if let Some(name) = &github_username {
            if self.users.exists_by_github_username(name).await? {
                return Err(AppError::bad_request(MSG_GITHUB_USERNAME_TAKEN));
            }
        }

        if self.users.exists_by_email(&request.email).await? {
            return Err(AppError::bad_request(MSG_EMAIL_TAKEN));
        }

        if !request.is_password_matching() {
            return Err(AppError::bad_request(MSG_PASSWORD_MISMATCH));
        }

        let password_hash = self.passwords.hash(&request.password).await?;

        let user = self
            .users
            .create(NewUser {
                email: request.email,
                password: Some(password_hash),
                nickname: request.nickname,
                developer_type: request.developer_type,
                hourly_rate: request.hourly_rate.map(normalize_hourly_rate),
                preferred_currency: request.preferred_currency,
                github_username,
                provider: PROVIDER_LOCAL.to_string(),
                email_verified: false,
                ..Default::default()
            })
            .await
            // A concurrent sign-up can win between the existence check and the insert
            .map_err(|err| match err.downcast_ref::<DuplicateEmail>() {
                Some(_) => AppError::bad_request(MSG_EMAIL_TAKEN),
                None => AppError::Internal(err),
            })?;

        info!(user_id = user.id, "User signed up");
        Ok(UserResponse::from(&user))
    }

    /// Unknown email, OAuth2-only account and wrong password all fail the same way.
    #[instrument(skip_all, fields(email = %request.email))]
    pub async fn sign_in(&self, request: LoginRequest) -> Result<AuthResponse, AppError> {
        let user = self
            .users
            .find_by_email(&request.email)
            .await?
            .ok_or(AppError::AuthenticationFailed)?;

        let Some(hash) = user.password.as_deref() else {
            warn!(user_id = user.id, provider = %user.provider, "Password sign-in on an OAuth2 account");
            return Err(AppError::AuthenticationFailed);
        };

        if !self.passwords.matches(&request.password, hash).await? {
            return Err(AppError::AuthenticationFailed);
        }

        info!(user_id = user.id, "User signed in");
        self.issue_tokens(&user)
    }

    /// Rotates the pair: the presented refresh token is revoked.
    #[instrument(skip_all)]
    pub async fn refresh(&self, request: RefreshTokenRequest) -> Result<AuthResponse, AppError> {
        let claims = self.jwt.decode(&request.refresh_token).map_err(|err| {
            crate::auth::jwt::log_validation_failure(&err);
            AppError::bad_request(MSG_INVALID_REFRESH_TOKEN)
        })?;

        if !claims.is_refresh() {
            return Err(AppError::bad_request(MSG_INVALID_REFRESH_TOKEN));
        }
        let user_id = claims
            .user_id()
            .ok_or_else(|| AppError::bad_request(MSG_INVALID_REFRESH_TOKEN))?;

        // Claiming the jti is the reuse check; concurrent refreshes get one winner
        let remaining = claims.remaining_seconds(Utc::now().timestamp());
        if !self.cache.revoke_once(&claims.jti, remaining).await? {
            warn!("Revoked refresh token presented");
            return Err(AppError::bad_request(MSG_INVALID_REFRESH_TOKEN));
        }

        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::not_found(MSG_USER_NOT_FOUND))?;

        info!(user_id, "Tokens refreshed");
        self.issue_tokens(&user)
    }

    /// Served from the user cache when possible.
    #[instrument(skip_all, fields(user_id = principal.id))]
    pub async fn current_user(&self, principal: &UserPrincipal) -> Result<UserResponse, AppError> {
        match self.cache.cached_user(principal.id).await {
            Ok(Some(cached)) => return Ok(cached),
            Ok(None) => {}
            Err(err) => warn!("User cache read failed: {:#}", err),
        }

        let user = self
            .users
            .find_by_id(principal.id)
            .await?
            .ok_or_else(|| AppError::not_found(MSG_USER_NOT_FOUND))?;
        let response = UserResponse::from(&user);

        if let Err(err) = self.cache.cache_user(&response, self.user_cache_ttl_seconds).await {
            warn!("User cache write failed: {:#}", err);
        }
        Ok(response)
    }

    /// Revokes the presenting access token and, when it belongs to the same
    /// user, the supplied refresh token.
    #[instrument(skip_all, fields(user_id = principal.id))]
    pub async fn logout(
        &self,
        principal: &UserPrincipal,
        request: Option<LogoutRequest>,
    ) -> Result<(), AppError> {
        let now = Utc::now().timestamp();
        let access_ttl = (principal.token_expires_at - now).max(0) as u64;
        self.cache
            .revoke_token(&principal.token_id, access_ttl)
            .await
            .context("Failed to revoke access token")?;

        let refresh_token = request
            .and_then(|body| body.refresh_token)
            .filter(|token| !token.trim().is_empty());

        if let Some(token) = refresh_token {
            match self.jwt.decode(&token) {
                Ok(claims) if claims.is_refresh() && claims.user_id() == Some(principal.id) => {
                    self.cache
                        .revoke_token(&claims.jti, claims.remaining_seconds(now))
                        .await
                        .context("Failed to revoke refresh token")?;
                }
                Ok(_) => warn!("Logout refresh token does not belong to the caller"),
                Err(err) => crate::auth::jwt::log_validation_failure(&err),
            }
        }

        if let Err(err) = self.cache.evict_user(principal.id).await {
            warn!("User cache eviction failed: {:#}", err);
        }

        info!("User logged out");
        Ok(())
    }

    /// Access + refresh pair for a user.
    pub fn issue_tokens(&self, user: &User) -> Result<AuthResponse, AppError> {
        Ok(AuthResponse {
            access_token: self.jwt.generate_access_token(user)?,
            refresh_token: self.jwt.generate_refresh_token(user.id)?,
            token_type: TOKEN_TYPE_BEARER.to_string(),
            expires_in: self.jwt.access_expires_in_seconds(),
            user: UserResponse::from(user),
        })
    }
}
