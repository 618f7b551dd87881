pub mod jwt;
pub mod middleware;
pub mod password;
pub mod principal;

pub use jwt::JwtTokenProvider;
pub use password::PasswordEncoder;
pub use principal::UserPrincipal;
