// Start of file: /src/config/mod.rs

/*
* Configuration: environment variables and shared application state.
*/

pub mod environment;
pub mod state;

// End of file: /src/config/mod.rs
