pub mod github;
pub mod user_info;

pub use github::GitHubOAuthService;
pub use user_info::{oauth2_user_info, GitHubOAuth2UserInfo, OAuth2UserInfo};
