//! HTTP API: server, routing, and request/response mapping.

pub mod app;
pub mod config;

pub use app::services::AppServices;
pub use config::{ApiConfig, ConfigError, RealtimeSettings};
