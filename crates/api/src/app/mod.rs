//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: stores, lifecycle managers and collaborators
//! - `routes/`: HTTP routes + handlers (one file per resource)
//! - `dto.rs`: request/response DTOs and JSON mapping helpers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use tower::ServiceBuilder;

use billing_infra::BillingConfig;
use billing_infra::notify::TransportError;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub fn build_app(config: &BillingConfig) -> Result<Router, TransportError> {
    let services = services::build_services(config)?;
    Ok(router_with(Arc::new(services)))
}

/// Router over already-wired services (tests inject their own collaborators).
pub fn router_with(services: Arc<services::AppServices>) -> Router {
    Router::new()
        .route("/health", get(routes::system::health))
        .nest("/api", routes::router())
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn(middleware::request_context))
                .layer(Extension(services)),
        )
}
