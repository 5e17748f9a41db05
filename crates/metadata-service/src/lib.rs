//! Metadata Datasource Service Library
//!
//! This library provides the HTTP surface for managing metadata data
//! sources: download, delete, import, ACL get/set, and temp-file staging.
//! Every operation delegates to the `MetadataService` collaborator and
//! translates outcomes and errors into HTTP responses.
//!
//! # Architecture
//!
//! The service follows the Handler -> Service pattern:
//!
//! ```text
//! routes/mod.rs -> handlers/*.rs -> services/*.rs
//! ```
//!
//! # Modules
//!
//! - `config` - Service configuration from environment
//! - `errors` - Error types with HTTP status code mapping
//! - `handlers` - HTTP request handlers
//! - `middleware` - HTTP metrics middleware
//! - `models` - Request/response payloads
//! - `observability` - Metric recording helpers
//! - `routes` - Axum router setup
//! - `services` - The metadata service collaborator and admin authorizer

pub mod config;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod observability;
pub mod routes;
pub mod services;
