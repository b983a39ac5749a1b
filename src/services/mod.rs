pub mod auth;
pub mod submissions;
