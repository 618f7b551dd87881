//! Provider-specific views over OAuth2 user attributes.

use serde_json::{Map, Value};

use crate::errors::AppError;
use crate::models::user::PROVIDER_GITHUB;

pub type Attributes = Map<String, Value>;

/// Normalised user attributes from an identity provider.
pub trait OAuth2UserInfo: Send + Sync {
    fn id(&self) -> Option<String>;
    fn name(&self) -> Option<String>;
    fn email(&self) -> Option<String>;
    fn image_url(&self) -> Option<String>;
    /// Provider login handle, when the provider has one
    fn login(&self) -> Option<String>;
}

/// Picks the attribute mapping for a registration id.
pub fn oauth2_user_info(
    registration_id: &str,
    attributes: Attributes,
) -> Result<Box<dyn OAuth2UserInfo>, AppError> {
    if registration_id.eq_ignore_ascii_case(PROVIDER_GITHUB) {
        Ok(Box::new(GitHubOAuth2UserInfo::new(attributes)))
    } else {
        Err(AppError::oauth2(format!(
            "Login with {registration_id} is not supported yet."
        )))
    }
}

#[derive(Debug, Clone)]
pub struct GitHubOAuth2UserInfo {
    attributes: Attributes,
}

impl GitHubOAuth2UserInfo {
    pub fn new(attributes: Attributes) -> Self {
        Self { attributes }
    }

    fn string(&self, key: &str) -> Option<String> {
        self.attributes
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }
}

impl OAuth2UserInfo for GitHubOAuth2UserInfo {
    /// GitHub ids are numbers; strings are accepted too.
    fn id(&self) -> Option<String> {
        match self.attributes.get("id")? {
            Value::Number(n) => Some(n.to_string()),
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            _ => None,
        }
    }

    fn name(&self) -> Option<String> {
        self.string("name").or_else(|| self.string("login"))
    }

    fn email(&self) -> Option<String> {
        self.string("email")
    }

    fn image_url(&self) -> Option<String> {
        self.string("avatar_url")
    }

    fn login(&self) -> Option<String> {
        self.string("login")
    }
}
