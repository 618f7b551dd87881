//! Domain entities, JWT claims and request/response DTOs.

pub mod claims;
pub mod requests;
pub mod responses;
pub mod user;

pub use claims::Claims;
pub use requests::*;
pub use responses::*;
pub use user::*;
