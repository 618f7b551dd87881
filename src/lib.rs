// Library root for the DevTracker API

pub mod api;
pub mod auth;
pub mod config;
pub mod core;
pub mod database;
pub mod errors;
pub mod models;
pub mod oauth2;
pub mod services;
pub mod utils;
pub mod validators;

pub use crate::config::environment::EnvironmentVariables;
pub use crate::config::state::AppState;
pub use crate::core::server::create_app;
pub use crate::errors::AppError;
