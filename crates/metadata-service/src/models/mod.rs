//! Metadata service models.
//!
//! Contains the request/response payloads exchanged with legacy BI
//! clients. Wire names are camelCase to match the original endpoint
//! contract; these types carry no persistent identity of their own.

use serde::{Deserialize, Serialize};

/// A locale properties file staged in the temp directory.
///
/// Pairs the name the client uploaded with the name assigned on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocaleFileBundle {
    /// File name as uploaded by the client.
    pub original_file_name: String,

    /// Name of the staged temp file (assigned by the server).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temp_file_name: Option<String>,
}

/// Bundle of uploaded file names pending import.
///
/// Produced by the temp-dir upload endpoint and consumed by the
/// import-from-temp endpoint, where clients hand it back as a serialized
/// JSON descriptor string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TempFilesList {
    /// Staged schema (XMI) temp file name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xmi_file_name: Option<String>,

    /// Staged locale files.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bundles: Vec<LocaleFileBundle>,
}

impl TempFilesList {
    /// Create an empty list (nothing staged yet).
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a serialized locale-file descriptor string.
    pub fn from_descriptor(descriptor: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(descriptor)
    }

    /// Serialize back to the descriptor string handed to clients.
    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Access-control entry for a domain.
///
/// Opaque pass-through between clients and the repository ACL subsystem;
/// the endpoint never interprets the fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AclDto {
    /// Owner of the domain artifact.
    pub owner: String,

    /// Owner type discriminator (user/role) as defined by the repository.
    pub owner_type: i32,

    /// Access-control entries.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entries: Vec<AclEntry>,
}

/// A single recipient/permission pairing within an ACL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AclEntry {
    /// Recipient name (user or role).
    pub recipient: String,

    /// Recipient type discriminator as defined by the repository.
    pub recipient_type: i32,

    /// Granted permission codes.
    #[serde(default)]
    pub permissions: Vec<i32>,
}

/// Response listing the ids of all metadata domains.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainListResponse {
    /// Domain ids known to the service.
    pub domains: Vec<String>,
}

/// Health check response.
///
/// Returned by the `/health` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service health status ("healthy" or "unhealthy").
    pub status: String,

    /// Storage directory reachability (omitted on failure).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage: Option<String>,
}

/// Request body for importing a previously staged domain.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportFromTempRequest {
    /// Serialized `TempFilesList` descriptor from the upload endpoint.
    pub locale_files: String,

    /// Whether an existing domain may be replaced.
    #[serde(default)]
    pub overwrite: bool,

    /// Optional ACL to apply to the imported domain.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acl: Option<AclDto>,
}
