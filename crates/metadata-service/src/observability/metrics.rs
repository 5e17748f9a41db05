//! Metrics definitions for the metadata service.
//!
//! All metrics follow Prometheus naming conventions:
//! - `md_` prefix for the metadata service
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Cardinality
//!
//! Labels are bounded to prevent cardinality explosion:
//! - `method`: HTTP verbs only
//! - `endpoint`: parameterized paths (domain ids and temp file names are
//!   replaced with placeholders)
//! - `status_code`: standard HTTP codes

use metrics::{counter, histogram};
use std::time::Duration;

/// Record HTTP request completion
///
/// Metric: `md_http_requests_total`, `md_http_request_duration_seconds`
/// Labels: `method`, `endpoint`, `status`/`status_code`
///
/// This captures ALL HTTP responses including framework-level errors like
/// 404 Not Found, 405 Method Not Allowed, and multipart decode failures.
pub fn record_http_request(method: &str, endpoint: &str, status_code: u16, duration: Duration) {
    // Normalize endpoint to prevent cardinality explosion
    let normalized_endpoint = normalize_endpoint(endpoint);

    // Determine status category for simplified querying
    let status = categorize_status_code(status_code);

    histogram!("md_http_request_duration_seconds",
        "method" => method.to_string(),
        "endpoint" => normalized_endpoint.clone(),
        "status" => status.to_string()
    )
    .record(duration.as_secs_f64());

    counter!("md_http_requests_total",
        "method" => method.to_string(),
        "endpoint" => normalized_endpoint,
        "status_code" => status_code.to_string()
    )
    .increment(1);
}

/// Categorize HTTP status code into success/error/timeout
fn categorize_status_code(status_code: u16) -> &'static str {
    match status_code {
        200..=299 => "success",
        408 | 504 => "timeout",
        _ => "error",
    }
}

/// Normalize endpoint path to prevent label cardinality explosion
///
/// Replaces dynamic segments (domain ids, temp file names) with
/// placeholders.
fn normalize_endpoint(path: &str) -> String {
    // Known static paths
    match path {
        "/" => "/".to_string(),
        "/health" => "/health".to_string(),
        "/metrics" => "/metrics".to_string(),
        "/api/v1/metadata/domains" => path.to_string(),
        "/api/v1/metadata/import" => path.to_string(),
        "/api/v1/metadata/upload" => path.to_string(),
        _ => normalize_dynamic_endpoint(path),
    }
}

/// Normalize paths with dynamic segments
fn normalize_dynamic_endpoint(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("/api/v1/metadata/temp/") {
        if rest.ends_with("/contains-model") {
            return "/api/v1/metadata/temp/{file}/contains-model".to_string();
        }
    }

    if let Some(rest) = path.strip_prefix("/api/v1/metadata/") {
        let mut segments = rest.split('/');
        let _domain_id = segments.next();
        return match segments.next() {
            Some("download") => "/api/v1/metadata/{id}/download".to_string(),
            Some("acl") => "/api/v1/metadata/{id}/acl".to_string(),
            Some("import-from-temp") => "/api/v1/metadata/{id}/import-from-temp".to_string(),
            Some(_) => "/api/v1/metadata/other".to_string(),
            None => "/api/v1/metadata/{id}".to_string(),
        };
    }

    "other".to_string()
}
