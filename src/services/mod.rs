pub mod auth_service;
pub mod oauth2_user_service;
pub mod user_service;

pub use auth_service::AuthService;
pub use oauth2_user_service::OAuth2UserService;
pub use user_service::UserService;
