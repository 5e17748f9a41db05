//! Metadata service error types.
//!
//! All errors map to appropriate HTTP status codes via the `IntoResponse`
//! impl. Error messages returned to clients are intentionally generic to
//! avoid leaking internal details. Actual errors are logged server-side.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Metadata service error type.
///
/// Maps to appropriate HTTP status codes:
/// - AccessDenied: 401 Unauthorized
/// - DomainNotFound: 409 Conflict (legacy client contract)
/// - Import, Internal: 500 Internal Server Error
///
/// The legacy import endpoint intercepts `Import` before this mapping
/// applies; see `handlers::metadata::import_domain_legacy`.
#[derive(Debug, Clone, Error)]
pub enum MetadataError {
    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Domain not found: {0}")]
    DomainNotFound(String),

    #[error("Import failed with status {status}: {message}")]
    Import { status: i32, message: String },

    #[error("Internal server error")]
    Internal(String),
}

impl MetadataError {
    /// Returns the HTTP status code for this error (for metrics recording).
    pub fn status_code(&self) -> u16 {
        match self {
            MetadataError::AccessDenied(_) => 401,
            MetadataError::DomainNotFound(_) => 409,
            MetadataError::Import { .. } | MetadataError::Internal(_) => 500,
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

impl IntoResponse for MetadataError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            MetadataError::AccessDenied(reason) => {
                (StatusCode::UNAUTHORIZED, "ACCESS_DENIED", reason.clone())
            }
            MetadataError::DomainNotFound(domain_id) => (
                StatusCode::CONFLICT,
                "DOMAIN_NOT_FOUND",
                format!("No files exist for domain '{}'", domain_id),
            ),
            MetadataError::Import { status, message } => {
                tracing::error!(
                    target: "metadata.import",
                    import_status = status,
                    error = %message,
                    "Metadata import failed"
                );
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "IMPORT_FAILED",
                    format!("Metadata import failed with status {}", status),
                )
            }
            MetadataError::Internal(err) => {
                // Log actual error server-side, return generic message to client
                tracing::error!(target: "metadata.internal", error = %err, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let error_response = ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        };

        let mut response = (status, Json(error_response)).into_response();

        // Add WWW-Authenticate header for 401 responses
        if status == StatusCode::UNAUTHORIZED {
            if let Ok(header_value) = "Bearer realm=\"metadata-api\"".parse() {
                response
                    .headers_mut()
                    .insert("WWW-Authenticate", header_value);
            }
        }

        response
    }
}

/// Convert I/O errors to MetadataError.
///
/// A missing file or directory is a `DomainNotFound` (the legacy contract
/// reports it as 409 Conflict); everything else is internal.
impl From<std::io::Error> for MetadataError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => MetadataError::DomainNotFound(err.to_string()),
            _ => MetadataError::Internal(err.to_string()),
        }
    }
}
