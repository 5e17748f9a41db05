//! Health check handler.
//!
//! Provides health check endpoints for liveness and readiness probes.

use crate::errors::MetadataError;
use crate::models::HealthResponse;
use crate::routes::AppState;
use axum::extract::State;
use axum::Json;
use std::sync::Arc;
use tracing::instrument;

/// Health check handler.
///
/// Probes the storage directory to verify reachability and returns the
/// service status.
///
/// ## Example Response
///
/// ```json
/// {
///   "status": "healthy",
///   "storage": "healthy"
/// }
/// ```
#[instrument(skip_all, name = "metadata.health.check")]
pub async fn health_check(
    State(state): State<Arc<AppState>>,
) -> Result<Json<HealthResponse>, MetadataError> {
    // Probe the storage root to verify the service can reach its files
    let storage_healthy = tokio::fs::metadata(&state.config.storage_dir)
        .await
        .map(|m| m.is_dir())
        .unwrap_or(false);

    let response = if storage_healthy {
        HealthResponse {
            status: "healthy".to_string(),
            storage: Some("healthy".to_string()),
        }
    } else {
        // Report unhealthy but still answer 200 - probes need the body
        HealthResponse {
            status: "unhealthy".to_string(),
            storage: Some("unhealthy".to_string()),
        }
    };

    Ok(Json(response))
}
