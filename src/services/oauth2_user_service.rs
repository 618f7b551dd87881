use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::database::{AuthCache, UserRepository};
use crate::errors::AppError;
use crate::models::user::{DeveloperType, NewUser, User};
use crate::oauth2::user_info::{oauth2_user_info, Attributes, OAuth2UserInfo};

pub const MSG_EMAIL_NOT_FOUND: &str = "Email not found from OAuth2 provider";

/// Links an OAuth2 identity to a local user, registering one on first login.
#[derive(Clone)]
pub struct OAuth2UserService {
    users: Arc<dyn UserRepository>,
    cache: Arc<dyn AuthCache>,
}

impl OAuth2UserService {
    pub fn new(users: Arc<dyn UserRepository>, cache: Arc<dyn AuthCache>) -> Self {
        Self { users, cache }
    }

    #[instrument(skip(self, attributes))]
    pub async fn process_oauth2_user(
        &self,
        registration_id: &str,
        attributes: Attributes,
    ) -> Result<User, AppError> {
        let info = oauth2_user_info(registration_id, attributes)?;

        let email = info
            .email()
            .ok_or_else(|| AppError::oauth2(MSG_EMAIL_NOT_FOUND))?;

        match self.users.find_by_email(&email).await? {
            Some(user) if !user.provider.eq_ignore_ascii_case(registration_id) => {
                Err(AppError::oauth2(format!(
                    "Looks like you're signed up with {provider} account. Please use your {provider} account to login.",
                    provider = user.provider
                )))
            }
            Some(user) => self.update_existing_user(user, info.as_ref()).await,
            None => self.register_new_user(registration_id, email, info.as_ref()).await,
        }
    }

    async fn register_new_user(
        &self,
        registration_id: &str,
        email: String,
        info: &dyn OAuth2UserInfo,
    ) -> Result<User, AppError> {
        let nickname = info.name().unwrap_or_else(|| email.clone());

        let user = self
            .users
            .create(NewUser {
                email,
                password: None,
                nickname,
                profile_image: info.image_url(),
                developer_type: Some(DeveloperType::Other),
                github_username: info.login(),
                provider: registration_id.to_lowercase(),
                provider_id: info.id(),
                email_verified: true,
                ..Default::default()
            })
            .await?;

        info!(user_id = user.id, "Registered user from OAuth2 login");
        Ok(user)
    }

    /// Syncs nickname, avatar and GitHub login; writes only when something changed.
    async fn update_existing_user(
        &self,
        mut user: User,
        info: &dyn OAuth2UserInfo,
    ) -> Result<User, AppError> {
        let name = info.name().filter(|name| *name != user.nickname);
        let image = info
            .image_url()
            .filter(|image| user.profile_image.as_deref() != Some(image.as_str()));
        let login = info
            .login()
            .filter(|login| user.github_username.as_deref() != Some(login.as_str()));

        if name.is_none() && image.is_none() && login.is_none() {
            return Ok(user);
        }

        user.update_profile(name.as_deref(), image.as_deref());
        if login.is_some() {
            user.update_github_username(login);
        }

        let saved = self.users.update(&user).await?;
        if let Err(err) = self.cache.evict_user(saved.id).await {
            warn!("User cache eviction failed: {:#}", err);
        }

        info!(user_id = saved.id, "Synced profile from OAuth2 login");
        Ok(saved)
    }
}
