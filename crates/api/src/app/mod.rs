//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: catalog store, notification hub and recommendation gateway
//! - `pricing.rs`: the price mutation path (validate, commit, broadcast)
//! - `routes/`: HTTP routes + handlers (one file per resource)
//! - `dto.rs`: request/response DTOs and parsing helpers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;

use crate::config::ApiConfig;

pub mod dto;
pub mod errors;
pub mod pricing;
pub mod routes;
pub mod services;

/// Build the full HTTP router from configuration (public entrypoint used by `main.rs`).
pub async fn build_app(config: &ApiConfig) -> anyhow::Result<(Router, Arc<services::AppServices>)> {
    let services = Arc::new(services::build_services(config).await?);
    Ok((build_app_with(services.clone()), services))
}

/// Build the router over already-wired services.
pub fn build_app_with(services: Arc<services::AppServices>) -> Router {
    Router::new()
        .route("/health", get(routes::system::health))
        .route("/ws", get(routes::realtime::ws_upgrade))
        .nest("/api", routes::router())
        .layer(ServiceBuilder::new().layer(Extension(services)))
}
