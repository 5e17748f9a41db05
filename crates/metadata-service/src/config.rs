//! Metadata service configuration.
//!
//! Configuration is loaded from environment variables. The admin token is
//! redacted in Debug output.

use std::collections::HashMap;
use std::env;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Default HTTP bind address.
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";

/// Default storage directory for domains and staged uploads.
pub const DEFAULT_STORAGE_DIR: &str = "./metadata-storage";

/// Default upload size limit in bytes (64 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 64 * 1024 * 1024;

/// Default request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECONDS: u64 = 30;

/// Metadata service configuration.
///
/// Loaded from environment variables with sensible defaults.
/// The admin token is redacted in Debug output to prevent credential
/// leakage.
#[derive(Clone)]
pub struct Config {
    /// Server bind address (default: "0.0.0.0:8080").
    pub bind_address: String,

    /// Root directory for domain storage and staged uploads.
    pub storage_dir: PathBuf,

    /// Bearer token granting the administrative capability.
    /// When unset, no caller can administer (downloads always 401).
    pub admin_token: Option<String>,

    /// Maximum accepted multipart upload size in bytes.
    pub max_upload_bytes: usize,

    /// Request timeout in seconds.
    pub request_timeout_seconds: u64,
}

/// Custom Debug implementation that redacts sensitive fields.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("bind_address", &self.bind_address)
            .field("storage_dir", &self.storage_dir)
            .field("admin_token", &"[REDACTED]")
            .field("max_upload_bytes", &self.max_upload_bytes)
            .field("request_timeout_seconds", &self.request_timeout_seconds)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid upload size configuration: {0}")]
    InvalidMaxUploadBytes(String),

    #[error("Invalid request timeout configuration: {0}")]
    InvalidRequestTimeout(String),
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let bind_address = vars
            .get("BIND_ADDRESS")
            .cloned()
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

        let storage_dir = vars
            .get("METADATA_STORAGE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STORAGE_DIR));

        let admin_token = vars
            .get("METADATA_ADMIN_TOKEN")
            .cloned()
            .filter(|t| !t.is_empty());

        // Parse upload limit with validation
        let max_upload_bytes = if let Some(value_str) = vars.get("MAX_UPLOAD_BYTES") {
            let value: usize = value_str.parse().map_err(|e| {
                ConfigError::InvalidMaxUploadBytes(format!(
                    "MAX_UPLOAD_BYTES must be a valid positive integer, got '{}': {}",
                    value_str, e
                ))
            })?;

            if value == 0 {
                return Err(ConfigError::InvalidMaxUploadBytes(
                    "MAX_UPLOAD_BYTES must be greater than 0".to_string(),
                ));
            }

            value
        } else {
            DEFAULT_MAX_UPLOAD_BYTES
        };

        // Parse request timeout with validation
        let request_timeout_seconds = if let Some(value_str) = vars.get("REQUEST_TIMEOUT_SECONDS") {
            let value: u64 = value_str.parse().map_err(|e| {
                ConfigError::InvalidRequestTimeout(format!(
                    "REQUEST_TIMEOUT_SECONDS must be a valid positive integer, got '{}': {}",
                    value_str, e
                ))
            })?;

            if value == 0 {
                return Err(ConfigError::InvalidRequestTimeout(
                    "REQUEST_TIMEOUT_SECONDS must be greater than 0".to_string(),
                ));
            }

            value
        } else {
            DEFAULT_REQUEST_TIMEOUT_SECONDS
        };

        Ok(Config {
            bind_address,
            storage_dir,
            admin_token,
            max_upload_bytes,
            request_timeout_seconds,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_from_vars_success_with_defaults() {
        let vars = HashMap::new();

        let config = Config::from_vars(&vars).expect("Config should load successfully");

        assert_eq!(config.bind_address, DEFAULT_BIND_ADDRESS);
        assert_eq!(config.storage_dir, PathBuf::from(DEFAULT_STORAGE_DIR));
        assert!(config.admin_token.is_none());
        assert_eq!(config.max_upload_bytes, DEFAULT_MAX_UPLOAD_BYTES);
        assert_eq!(
            config.request_timeout_seconds,
            DEFAULT_REQUEST_TIMEOUT_SECONDS
        );
    }

    #[test]
    fn test_from_vars_success_with_custom_values() {
        let vars = HashMap::from([
            ("BIND_ADDRESS".to_string(), "127.0.0.1:9000".to_string()),
            (
                "METADATA_STORAGE_DIR".to_string(),
                "/var/lib/metadata".to_string(),
            ),
            ("METADATA_ADMIN_TOKEN".to_string(), "s3cret".to_string()),
            ("MAX_UPLOAD_BYTES".to_string(), "1048576".to_string()),
            ("REQUEST_TIMEOUT_SECONDS".to_string(), "60".to_string()),
        ]);

        let config = Config::from_vars(&vars).expect("Config should load successfully");

        assert_eq!(config.bind_address, "127.0.0.1:9000");
        assert_eq!(config.storage_dir, PathBuf::from("/var/lib/metadata"));
        assert_eq!(config.admin_token.as_deref(), Some("s3cret"));
        assert_eq!(config.max_upload_bytes, 1048576);
        assert_eq!(config.request_timeout_seconds, 60);
    }

    #[test]
    fn test_empty_admin_token_treated_as_unset() {
        let vars = HashMap::from([("METADATA_ADMIN_TOKEN".to_string(), String::new())]);

        let config = Config::from_vars(&vars).expect("Config should load successfully");
        assert!(config.admin_token.is_none());
    }

    #[test]
    fn test_max_upload_bytes_rejects_zero() {
        let vars = HashMap::from([("MAX_UPLOAD_BYTES".to_string(), "0".to_string())]);

        let result = Config::from_vars(&vars);
        assert!(
            matches!(result, Err(ConfigError::InvalidMaxUploadBytes(msg)) if msg.contains("must be greater than 0"))
        );
    }

    #[test]
    fn test_max_upload_bytes_rejects_non_numeric() {
        let vars = HashMap::from([("MAX_UPLOAD_BYTES".to_string(), "lots".to_string())]);

        let result = Config::from_vars(&vars);
        assert!(
            matches!(result, Err(ConfigError::InvalidMaxUploadBytes(msg)) if msg.contains("must be a valid positive integer"))
        );
    }

    #[test]
    fn test_request_timeout_rejects_zero() {
        let vars = HashMap::from([("REQUEST_TIMEOUT_SECONDS".to_string(), "0".to_string())]);

        let result = Config::from_vars(&vars);
        assert!(
            matches!(result, Err(ConfigError::InvalidRequestTimeout(msg)) if msg.contains("must be greater than 0"))
        );
    }

    #[test]
    fn test_request_timeout_rejects_non_numeric() {
        let vars = HashMap::from([("REQUEST_TIMEOUT_SECONDS".to_string(), "soon".to_string())]);

        let result = Config::from_vars(&vars);
        assert!(
            matches!(result, Err(ConfigError::InvalidRequestTimeout(msg)) if msg.contains("must be a valid positive integer"))
        );
    }

    #[test]
    fn test_debug_redacts_admin_token() {
        let vars = HashMap::from([("METADATA_ADMIN_TOKEN".to_string(), "s3cret".to_string())]);
        let config = Config::from_vars(&vars).expect("Config should load successfully");

        let debug_output = format!("{:?}", config);

        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("s3cret"));
    }
}
