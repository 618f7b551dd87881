use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::database::{AuthCache, UserRepository};
use crate::errors::{AppError, MSG_USER_NOT_FOUND};
use crate::models::requests::UpdateProfileRequest;
use crate::models::responses::{DeveloperTypeCount, DeveloperTypeStats, UserResponse};
use crate::models::user::DeveloperType;
use crate::services::auth_service::MSG_GITHUB_USERNAME_TAKEN;

/// Profile updates and public user statistics.
#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserRepository>,
    cache: Arc<dyn AuthCache>,
}

impl UserService {
    pub fn new(users: Arc<dyn UserRepository>, cache: Arc<dyn AuthCache>) -> Self {
        Self { users, cache }
    }

    /// Applies the present fields; an empty GitHub username clears it.
    #[instrument(skip(self, request))]
    pub async fn update_profile(
        &self,
        user_id: i64,
        request: UpdateProfileRequest,
    ) -> Result<UserResponse, AppError> {
        let mut user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::not_found(MSG_USER_NOT_FOUND))?;

        if let Some(raw) = request.github_username {
            let name = Some(raw.trim().to_string()).filter(|n| !n.is_empty());
            if let Some(name) = &name {
                if let Some(owner) = self.users.find_by_github_username(name).await? {
                    if owner.id != user.id {
                        return Err(AppError::bad_request(MSG_GITHUB_USERNAME_TAKEN));
                    }
                }
            }
            user.update_github_username(name);
        }

        user.update_profile(request.nickname.as_deref(), request.profile_image.as_deref());
        user.update_developer_info(request.developer_type, request.hourly_rate);

        let saved = self.users.update(&user).await?;
        if let Err(err) = self.cache.evict_user(saved.id).await {
            warn!("User cache eviction failed: {:#}", err);
        }

        info!(user_id = saved.id, "Profile updated");
        Ok(UserResponse::from(&saved))
    }

    /// Number of users per developer type, every type listed.
    pub async fn developer_type_stats(&self) -> Result<DeveloperTypeStats, AppError> {
        let mut by_type = Vec::with_capacity(DeveloperType::ALL.len());
        for developer_type in DeveloperType::ALL {
            by_type.push(DeveloperTypeCount {
                developer_type,
                display_name: developer_type.display_name().to_string(),
                count: self.users.count_by_developer_type(developer_type).await?,
            });
        }

        Ok(DeveloperTypeStats {
            total: by_type.iter().map(|entry| entry.count).sum(),
            by_type,
        })
    }
}
