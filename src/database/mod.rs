pub mod memory;
pub mod postgres_service;
pub mod redis_manager;
pub mod user_repository;

pub use memory::{MemoryAuthCache, MemoryUserRepository};
pub use postgres_service::DatabaseService;
pub use redis_manager::{AuthCache, RedisService};
pub use user_repository::{DuplicateEmail, PgUserRepository, UserRepository};
