//! HTTP API application wiring (Axum router + service wiring).
//!
//! This folder is structured like:
//! - `services.rs`: store handle + action execution
//! - `routes/`: HTTP routes + handlers
//! - `dto.rs`: JSON envelope and product mapping helpers
//! - `errors.rs`: outcome/error to response mapping

use std::sync::Arc;

use anyhow::Context;
use axum::{routing::get, Extension, Router};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use inventario_infra::{AppConfig, ProductStore};

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

pub use services::{AppServices, ResponseOptions};

/// Build the full HTTP router (public entrypoint used by `main.rs`).
///
/// Opens the configured database and bootstraps the `productos` table.
pub async fn build_app(config: &AppConfig) -> anyhow::Result<Router> {
    let store = inventario_infra::connect(&config.database)
        .await
        .with_context(|| format!("failed to open product store at {}", redact_url(&config.database.url)))?;

    Ok(router_with_store(store, ResponseOptions::from(config)))
}

/// Build the router around an already-open store.
pub fn router_with_store(store: Arc<dyn ProductStore>, options: ResponseOptions) -> Router {
    let services = Arc::new(AppServices::new(store, options));

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(routes::router())
        .layer(Extension(services))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
}

/// Strip credentials from a database URL before it reaches a log line.
fn redact_url(url: &str) -> String {
    match (url.find("://"), url.rfind('@')) {
        (Some(scheme_end), Some(at)) if at > scheme_end => {
            format!("{}://***{}", &url[..scheme_end], &url[at..])
        }
        _ => url.to_string(),
    }
}
