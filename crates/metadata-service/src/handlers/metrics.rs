//! Prometheus metrics endpoint handler.
//!
//! Provides the `/metrics` endpoint for Prometheus scraping.
//!
//! # Security
//!
//! This endpoint is unauthenticated to allow Prometheus to scrape metrics.
//! No domain content or tokens are exposed, only operational data with
//! bounded cardinality labels.

use axum::{extract::State, response::IntoResponse};
use metrics_exporter_prometheus::PrometheusHandle;

/// Handler for GET /metrics
///
/// Returns Prometheus-formatted metrics for scraping.
/// This is an operational endpoint, not versioned under /api/v1.
#[tracing::instrument(skip_all, name = "metadata.metrics.scrape")]
pub async fn metrics_handler(State(handle): State<PrometheusHandle>) -> impl IntoResponse {
    handle.render()
}

#[cfg(test)]
mod tests {
    // Testing the metrics endpoint requires a PrometheusHandle, which can
    // only be created once per process via PrometheusBuilder. The endpoint
    // is covered by the integration tests; metric recording itself is
    // covered by the observability module tests.
}
