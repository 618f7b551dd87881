// Response envelope and layer error mapping shared by every route

pub mod error_handler;
pub mod response_handler;
