// HTTP surface: one module per resource, each with its handlers and routes

pub mod actuator;
pub mod auth;
pub mod docs;
pub mod extractors;
pub mod oauth2;
pub mod public;
pub mod users;
