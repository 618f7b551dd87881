//! GitHub authorization-code flow: authorize URL, state tracking, code
//! exchange and user attribute loading.

use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use moka::future::Cache;
use reqwest::header::{ACCEPT, USER_AGENT};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::environment::EnvironmentVariables;
use crate::oauth2::user_info::Attributes;

pub const GITHUB_SCOPES: &str = "read:user user:email";
/// Pending authorization states expire after ten minutes
const STATE_TTL: Duration = Duration::from_secs(600);
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);
const CLIENT_USER_AGENT: &str = "devtracker-api";

/// Where to send the browser, and the state it must come back with.
#[derive(Debug, Clone)]
pub struct AuthorizationRequest {
    pub url: String,
    pub state: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GitHubEmail {
    email: String,
    primary: bool,
    verified: bool,
}

#[derive(Clone)]
pub struct GitHubOAuthService {
    client_id: Option<String>,
    client_secret: Option<String>,
    authorize_url: String,
    token_url: String,
    api_url: String,
    callback_url: String,
    http_client: reqwest::Client,
    pending_states: Cache<String, ()>,
}

impl std::fmt::Debug for GitHubOAuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubOAuthService")
            .field("enabled", &self.is_enabled())
            .field("authorize_url", &self.authorize_url)
            .field("api_url", &self.api_url)
            .finish_non_exhaustive()
    }
}

impl GitHubOAuthService {
    pub fn new(env: &EnvironmentVariables) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client_id: env.github_client_id.clone(),
            client_secret: env.github_client_secret.clone(),
            authorize_url: env.github_authorize_url.to_string(),
            token_url: env.github_token_url.to_string(),
            api_url: env.github_api_url.trim_end_matches('/').to_string(),
            callback_url: env.oauth2_callback_url.clone(),
            http_client,
            pending_states: Cache::builder()
                .time_to_live(STATE_TTL)
                .max_capacity(10_000)
                .build(),
        })
    }

    /// Login is available once a client id is configured.
    pub fn is_enabled(&self) -> bool {
        self.client_id.is_some()
    }

    /// Builds the GitHub authorize URL and remembers its one-time state.
    pub async fn authorization_url(&self) -> Result<AuthorizationRequest> {
        let client_id = self
            .client_id
            .as_deref()
            .ok_or_else(|| anyhow!("GitHub OAuth2 client is not configured"))?;

        let state = Uuid::new_v4().simple().to_string();
        self.pending_states.insert(state.clone(), ()).await;

        let mut url = url::Url::parse(&self.authorize_url).context("Invalid GitHub authorize URL")?;
        url.query_pairs_mut()
            .append_pair("client_id", client_id)
            .append_pair("redirect_uri", &self.callback_url)
            .append_pair("scope", GITHUB_SCOPES)
            .append_pair("state", &state);

        debug!("Generated GitHub authorization URL");
        Ok(AuthorizationRequest {
            url: url.into(),
            state,
        })
    }

    /// `true` exactly once per issued, unexpired state.
    pub async fn consume_state(&self, state: &str) -> bool {
        self.pending_states.remove(state).await.is_some()
    }

    /// Exchanges an authorization code for a GitHub access token.
    pub async fn exchange_code(&self, code: &str) -> Result<String> {
        let (Some(client_id), Some(client_secret)) = (&self.client_id, &self.client_secret) else {
            bail!("GitHub OAuth2 client is not configured");
        };

        let params = [
            ("client_id", client_id.as_str()),
            ("client_secret", client_secret.as_str()),
            ("code", code),
            ("redirect_uri", self.callback_url.as_str()),
        ];

        let response = self
            .http_client
            .post(&self.token_url)
            .header(ACCEPT, "application/json")
            .header(USER_AGENT, CLIENT_USER_AGENT)
            .form(&params)
            .send()
            .await
            .context("GitHub token request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            bail!("Token exchange failed with {status}: {body}");
        }

        // GitHub reports exchange errors with a 200 and an `error` field
        let token: TokenResponse = response.json().await.context("Malformed token response")?;
        match (token.access_token, token.error) {
            (Some(access_token), None) => {
                info!("Exchanged GitHub authorization code");
                Ok(access_token)
            }
            (_, error) => bail!(
                "Token exchange rejected: {}",
                token
                    .error_description
                    .or(error)
                    .unwrap_or_else(|| "no access token".to_string())
            ),
        }
    }

    /// Loads `/user`; a missing email is filled from the primary verified
    /// address in `/user/emails`.
    pub async fn fetch_user_attributes(&self, access_token: &str) -> Result<Attributes> {
        let user: Value = self.get_json(&format!("{}/user", self.api_url), access_token).await?;
        let mut attributes = match user {
            Value::Object(map) => map,
            _ => bail!("GitHub /user did not return an object"),
        };

        let has_email = attributes
            .get("email")
            .and_then(Value::as_str)
            .is_some_and(|email| !email.is_empty());

        if !has_email {
            match self.primary_verified_email(access_token).await {
                Ok(Some(email)) => {
                    attributes.insert("email".to_string(), Value::String(email));
                }
                Ok(None) => debug!("GitHub account has no primary verified email"),
                Err(err) => warn!("Failed to load GitHub emails: {:#}", err),
            }
        }

        Ok(attributes)
    }

    async fn primary_verified_email(&self, access_token: &str) -> Result<Option<String>> {
        let emails: Value = self
            .get_json(&format!("{}/user/emails", self.api_url), access_token)
            .await?;
        let emails: Vec<GitHubEmail> =
            serde_json::from_value(emails).context("Malformed GitHub emails response")?;

        Ok(emails
            .into_iter()
            .find(|e| e.primary && e.verified)
            .map(|e| e.email))
    }

    async fn get_json(&self, url: &str, access_token: &str) -> Result<Value> {
        let response = self
            .http_client
            .get(url)
            .bearer_auth(access_token)
            .header(ACCEPT, "application/vnd.github+json")
            .header(USER_AGENT, CLIENT_USER_AGENT)
            .send()
            .await
            .with_context(|| format!("GitHub request to {url} failed"))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            bail!("GitHub request to {url} failed with {status}: {body}");
        }

        response
            .json()
            .await
            .with_context(|| format!("Malformed GitHub response from {url}"))
    }
}
