pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod session;
pub mod store;
pub mod telemetry;
pub mod viewmodel;
