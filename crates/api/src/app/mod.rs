//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: store selection and service wiring
//! - `routes/`: HTTP routes + handlers (one file per domain area)
//! - `dto.rs`: request/response DTOs and JSON mapping helpers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use tower::ServiceBuilder;

use autoproposal_infra::{AppConfig, RecordStore, StoreError};

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

use services::{ConfiguredStore, Services};

/// Build the full HTTP router for `config` (public entrypoint used by `main.rs`).
pub async fn build_app(config: &AppConfig) -> Result<Router, StoreError> {
    let router = match services::build_store(config).await? {
        ConfiguredStore::InMemory(store) => build_router(Arc::new(Services::new(Arc::new(store)))),
        ConfiguredStore::Postgres(store) => build_router(Arc::new(Services::new(Arc::new(store)))),
    };
    Ok(router)
}

/// Router over an already-built set of services.
pub fn build_router<S: RecordStore>(services: Arc<Services<S>>) -> Router {
    Router::new()
        .route("/health", get(routes::system::health))
        .merge(routes::router::<S>())
        .layer(ServiceBuilder::new().layer(Extension(services)))
}
