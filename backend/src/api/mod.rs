pub mod auth;
pub mod server;
pub mod tasks;
pub mod token;
