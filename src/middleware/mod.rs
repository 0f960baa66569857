pub mod actor;
pub mod auth;
