//! HS256 access/refresh token issuing and validation.

use anyhow::{Context, Result};
use chrono::Utc;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::environment::EnvironmentVariables;
use crate::models::claims::{Claims, TOKEN_TYPE_ACCESS, TOKEN_TYPE_REFRESH};
use crate::models::user::User;

#[derive(Clone)]
pub struct JwtTokenProvider {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    access_expiration_ms: u64,
    refresh_expiration_ms: u64,
}

impl std::fmt::Debug for JwtTokenProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtTokenProvider")
            .field("access_expiration_ms", &self.access_expiration_ms)
            .field("refresh_expiration_ms", &self.refresh_expiration_ms)
            .finish_non_exhaustive()
    }
}

impl JwtTokenProvider {
    pub fn new(secret: &str, access_expiration_ms: u64, refresh_expiration_ms: u64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub", "iat"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            access_expiration_ms,
            refresh_expiration_ms,
        }
    }

    pub fn from_env(env: &EnvironmentVariables) -> Self {
        Self::new(&env.jwt_secret, env.jwt_expiration_ms, env.jwt_refresh_expiration_ms)
    }

    /// Access token lifetime in whole seconds, as reported in `expiresIn`.
    pub fn access_expires_in_seconds(&self) -> u64 {
        self.access_expiration_ms / 1000
    }

    pub fn generate_access_token(&self, user: &User) -> Result<String> {
        let claims = self.claims_for(
            user.id,
            TOKEN_TYPE_ACCESS,
            self.access_expiration_ms,
            Some(user.email.clone()),
            Some(user.nickname.clone()),
        );
        self.sign(&claims).context("Failed to sign access token")
    }

    pub fn generate_refresh_token(&self, user_id: i64) -> Result<String> {
        let claims = self.claims_for(user_id, TOKEN_TYPE_REFRESH, self.refresh_expiration_ms, None, None);
        self.sign(&claims).context("Failed to sign refresh token")
    }

    /// Decodes and verifies signature and expiry.
    pub fn decode(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        decode::<Claims>(token, &self.decoding_key, &self.validation).map(|data| data.claims)
    }

    fn claims_for(
        &self,
        user_id: i64,
        typ: &str,
        lifetime_ms: u64,
        email: Option<String>,
        nickname: Option<String>,
    ) -> Claims {
        let now = Utc::now().timestamp();
        Claims {
            sub: user_id.to_string(),
            iat: now,
            exp: now + (lifetime_ms / 1000) as i64,
            jti: Uuid::new_v4().to_string(),
            typ: typ.to_string(),
            email,
            nickname,
        }
    }

    fn sign(&self, claims: &Claims) -> jsonwebtoken::errors::Result<String> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
    }
}

pub fn log_validation_failure(err: &jsonwebtoken::errors::Error) {
    match err.kind() {
        ErrorKind::InvalidSignature => warn!("Invalid JWT signature"),
        ErrorKind::ExpiredSignature => debug!("Expired JWT token"),
        ErrorKind::InvalidToken | ErrorKind::Base64(_) | ErrorKind::Json(_) | ErrorKind::Utf8(_) => {
            warn!("Invalid JWT token")
        }
        ErrorKind::InvalidAlgorithm | ErrorKind::InvalidAlgorithmName => warn!("Unsupported JWT token"),
        ErrorKind::MissingRequiredClaim(claim) => warn!(claim = %claim, "JWT claim missing"),
        other => warn!("JWT validation failed: {:?}", other),
    }
}
