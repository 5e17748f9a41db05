//! HTTP routes for the metadata service.
//!
//! Defines the Axum router and application state.

use crate::config::Config;
use crate::handlers;
use crate::middleware::http_metrics::http_metrics_middleware;
use crate::services::{AdminAuthorizer, MetadataService};
use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// The metadata service collaborator behind every operation.
    pub service: Arc<dyn MetadataService>,

    /// Administrative capability check for the download endpoint.
    pub authorizer: Arc<dyn AdminAuthorizer>,

    /// Service configuration.
    pub config: Config,
}

/// Build the application routes.
///
/// Creates an Axum router with:
/// - the metadata resource under `/api/v1/metadata`
/// - `/health` probe and optional Prometheus `/metrics`
/// - TraceLayer for request logging, request timeout, body size limit,
///   and the HTTP metrics middleware as the outermost layer
pub fn build_routes(state: Arc<AppState>, metrics_handle: Option<PrometheusHandle>) -> Router {
    let timeout = Duration::from_secs(state.config.request_timeout_seconds);
    let body_limit = state.config.max_upload_bytes;

    let api_routes = Router::new()
        // Metadata resource
        .route("/api/v1/metadata/domains", get(handlers::list_domains))
        .route("/api/v1/metadata/import", put(handlers::import_domain_legacy))
        .route("/api/v1/metadata/upload", post(handlers::upload_to_temp_dir))
        .route(
            "/api/v1/metadata/temp/:temp_file_name/contains-model",
            get(handlers::contains_model),
        )
        .route("/api/v1/metadata/:domain_id", delete(handlers::delete_domain))
        .route(
            "/api/v1/metadata/:domain_id/download",
            get(handlers::download_domain),
        )
        .route(
            "/api/v1/metadata/:domain_id/acl",
            get(handlers::get_domain_acl).put(handlers::set_domain_acl),
        )
        .route(
            "/api/v1/metadata/:domain_id/import-from-temp",
            post(handlers::import_from_temp),
        )
        // Health check endpoint
        .route("/health", get(handlers::health_check))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state);

    // Prometheus scrape endpoint carries its own state (the exporter
    // handle); merged separately. Absent when no recorder is installed
    // (e.g. most tests).
    let router = match metrics_handle {
        Some(handle) => api_routes.merge(
            Router::new()
                .route("/metrics", get(handlers::metrics_handler))
                .with_state(handle),
        ),
        None => api_routes,
    };

    // Layer order (bottom-to-top execution):
    // 1. TimeoutLayer - Timeout the request (innermost)
    // 2. TraceLayer - Log request details
    // 3. http_metrics_middleware - Record every response (outermost)
    router
        .layer(TimeoutLayer::new(timeout))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(http_metrics_middleware))
}
