//! Metadata datasource handlers.
//!
//! Implements the legacy metadata resource surface:
//!
//! - `GET /api/v1/metadata/domains` - List domain ids
//! - `GET /api/v1/metadata/{id}/download` - Download domain files (admin only)
//! - `DELETE /api/v1/metadata/{id}` - Remove a domain
//! - `PUT /api/v1/metadata/import` - Legacy one-shot import (multipart)
//! - `GET /api/v1/metadata/{id}/acl` - Read domain ACL
//! - `PUT /api/v1/metadata/{id}/acl` - Replace domain ACL
//! - `POST /api/v1/metadata/{id}/import-from-temp` - Import staged files
//! - `GET /api/v1/metadata/temp/{file}/contains-model` - Probe staged schema
//! - `POST /api/v1/metadata/upload` - Stage multipart upload in temp dir
//!
//! Handlers own no business logic: each call delegates to the
//! `MetadataService` collaborator and translates the outcome into a
//! response. The legacy import endpoint keeps the status-code-as-body
//! contract its clients depend on.

use crate::errors::MetadataError;
use crate::models::{AclDto, DomainListResponse, ImportFromTempRequest, TempFilesList};
use crate::routes::AppState;
use crate::services::{DomainFile, ImportRequest, UploadedFile, IMPORT_STATUS_REJECTED};
use axum::{
    extract::{Multipart, Path, State},
    http::{
        header::{CONTENT_DISPOSITION, CONTENT_TYPE},
        HeaderMap, StatusCode,
    },
    response::{IntoResponse, Response},
    Json,
};
use std::io::Write;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use zip::write::{FileOptions, ZipWriter};

/// Legacy import status reported to clients on success.
const IMPORT_SUCCESS_CODE: &str = "3";

/// Body reported by the import-from-temp endpoint on success.
const TEMP_IMPORT_SUCCESS_CODE: &str = "200";

// Multipart field names fixed by the legacy clients.
const FIELD_DOMAIN_ID: &str = "domainId";
const FIELD_METADATA_FILE: &str = "metadataFile";
const FIELD_OVERWRITE: &str = "overwrite";
const FIELD_LOCALE_FILES: &str = "localeFiles";
const FIELD_ACL: &str = "acl";

// ============================================================================
// Handler: GET /api/v1/metadata/domains
// ============================================================================

/// Handler for GET /api/v1/metadata/domains
///
/// Lists the ids of all metadata domains known to the service.
#[instrument(skip_all, name = "metadata.handlers.list_domains")]
pub async fn list_domains(
    State(state): State<Arc<AppState>>,
) -> Result<Json<DomainListResponse>, MetadataError> {
    let domains = state.service.list_domain_ids().await?;
    Ok(Json(DomainListResponse { domains }))
}

// ============================================================================
// Handler: GET /api/v1/metadata/{id}/download
// ============================================================================

/// Handler for GET /api/v1/metadata/{id}/download
///
/// Downloads a domain's files as a binary attachment: a single file is
/// served raw, multiple files are zipped.
///
/// # Response
///
/// - 200 OK: attachment with `Content-Disposition`
/// - 401 Unauthorized: caller lacks the administrative capability
/// - 500 Internal Server Error: any other failure
#[instrument(skip(state, headers), fields(domain_id = %domain_id))]
pub async fn download_domain(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(domain_id): Path<String>,
) -> Result<Response, MetadataError> {
    if !state.authorizer.can_administer(bearer_token(&headers)) {
        warn!(
            target: "metadata.handlers.download",
            domain_id = %domain_id,
            "Download denied: caller cannot administer"
        );
        return Err(MetadataError::AccessDenied(
            "Administrative capability required".to_string(),
        ));
    }

    // Everything past the admin gate coarsens to 500 for this endpoint
    let files = state
        .service
        .domain_files(&domain_id)
        .await
        .map_err(|e| MetadataError::Internal(e.to_string()))?;

    info!(
        target: "metadata.handlers.download",
        domain_id = %domain_id,
        files = files.len(),
        "Serving domain download"
    );

    build_attachment(&domain_id, files)
}

/// Build the attachment response: single file raw, multiple files zipped.
fn build_attachment(domain_id: &str, files: Vec<DomainFile>) -> Result<Response, MetadataError> {
    let (file_name, content) = match files.as_slice() {
        [single] => (single.name.clone(), single.content.to_vec()),
        _ => (format!("{}.zip", domain_id), zip_files(&files)?),
    };

    let disposition = format!("attachment; filename=\"{}\"", file_name);
    Ok((
        [
            (CONTENT_TYPE, "application/octet-stream".to_string()),
            (CONTENT_DISPOSITION, disposition),
        ],
        content,
    )
        .into_response())
}

fn zip_files(files: &[DomainFile]) -> Result<Vec<u8>, MetadataError> {
    let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));
    for file in files {
        zip.start_file::<_, ()>(file.name.as_str(), FileOptions::default())
            .map_err(|e| MetadataError::Internal(format!("Zip entry failed: {}", e)))?;
        zip.write_all(&file.content)
            .map_err(|e| MetadataError::Internal(format!("Zip write failed: {}", e)))?;
    }
    let cursor = zip
        .finish()
        .map_err(|e| MetadataError::Internal(format!("Zip finish failed: {}", e)))?;
    Ok(cursor.into_inner())
}

// ============================================================================
// Handler: DELETE /api/v1/metadata/{id}
// ============================================================================

/// Handler for DELETE /api/v1/metadata/{id}
///
/// Removes a domain. Access-control failures from the service surface
/// as 401.
#[instrument(skip(state), fields(domain_id = %domain_id))]
pub async fn delete_domain(
    State(state): State<Arc<AppState>>,
    Path(domain_id): Path<String>,
) -> Result<StatusCode, MetadataError> {
    state.service.remove_domain(&domain_id).await?;
    Ok(StatusCode::OK)
}

// ============================================================================
// Handler: PUT /api/v1/metadata/import
// ============================================================================

/// Handler for PUT /api/v1/metadata/import
///
/// Legacy one-shot import: multipart payload carrying the domain id, the
/// schema (XMI) file, locale files, a string overwrite flag, and an
/// optional ACL.
///
/// # Response
///
/// The legacy contract reports the importer's status code as the body:
///
/// - 200, body `"3"`: imported
/// - 200, body `n`: import error with recoverable sub-status `n`
///   (e.g. `"1"` for a duplicate domain)
/// - 500 with context naming the domain: import error with sub-status 10
/// - 500: access-control failure or unclassified error
#[instrument(skip_all, name = "metadata.handlers.import_legacy")]
pub async fn import_domain_legacy(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Response, MetadataError> {
    let form = read_import_form(multipart).await?;
    let domain_id = form.domain_id.clone();

    match state.service.import_domain(form).await {
        Ok(()) => {
            info!(
                target: "metadata.handlers.import_legacy",
                domain_id = %domain_id,
                "Domain imported"
            );
            Ok((StatusCode::OK, IMPORT_SUCCESS_CODE).into_response())
        }
        Err(MetadataError::AccessDenied(reason)) => {
            // The legacy import path reports access failures as a server
            // error, not 401
            warn!(
                target: "metadata.handlers.import_legacy",
                domain_id = %domain_id,
                reason = %reason,
                "Import denied"
            );
            Ok((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({
                    "error": { "code": "ACCESS_DENIED", "message": reason }
                })),
            )
                .into_response())
        }
        Err(MetadataError::Import { status, message }) if status == IMPORT_STATUS_REJECTED => {
            warn!(
                target: "metadata.handlers.import_legacy",
                domain_id = %domain_id,
                import_status = status,
                error = %message,
                "Import rejected"
            );
            Ok((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({
                    "error": {
                        "code": "IMPORT_FAILED",
                        "message": message,
                        "domainId": domain_id,
                        "importStatus": status,
                    }
                })),
            )
                .into_response())
        }
        Err(MetadataError::Import { status, message }) => {
            // Recoverable sub-status: the legacy contract is 200 with the
            // status code as body
            info!(
                target: "metadata.handlers.import_legacy",
                domain_id = %domain_id,
                import_status = status,
                error = %message,
                "Import finished with non-fatal status"
            );
            Ok((StatusCode::OK, status.to_string()).into_response())
        }
        Err(other) => Err(other),
    }
}

/// The legacy import flag is a loose string boolean: true iff non-empty
/// and not "false" (case-insensitive) after trimming. Legacy clients send
/// the literal string "overwrite".
fn parse_overwrite_flag(value: &str) -> bool {
    let trimmed = value.trim();
    !trimmed.is_empty() && !trimmed.eq_ignore_ascii_case("false")
}

/// Extract the legacy import form from a multipart payload.
async fn read_import_form(mut multipart: Multipart) -> Result<ImportRequest, MetadataError> {
    let mut domain_id: Option<String> = None;
    let mut xmi: Option<UploadedFile> = None;
    let mut overwrite = false;
    let mut locale_files: Vec<UploadedFile> = Vec::new();
    let mut acl: Option<AclDto> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| MetadataError::Internal(format!("Multipart decode failed: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            FIELD_DOMAIN_ID => {
                domain_id = Some(read_text_field(field).await?);
            }
            FIELD_METADATA_FILE => {
                xmi = Some(read_file_field(field, "metadata.xmi").await?);
            }
            FIELD_OVERWRITE => {
                overwrite = parse_overwrite_flag(&read_text_field(field).await?);
            }
            FIELD_LOCALE_FILES => {
                locale_files.push(read_file_field(field, "locale.properties").await?);
            }
            FIELD_ACL => {
                let raw = read_text_field(field).await?;
                acl = Some(serde_json::from_str(&raw).map_err(|e| {
                    MetadataError::Internal(format!("Invalid ACL payload: {}", e))
                })?);
            }
            other => {
                warn!(
                    target: "metadata.handlers.import_legacy",
                    field = %other,
                    "Ignoring unknown multipart field"
                );
            }
        }
    }

    let domain_id = domain_id
        .ok_or_else(|| MetadataError::Internal("Missing multipart field 'domainId'".to_string()))?;
    let xmi = xmi.ok_or_else(|| {
        MetadataError::Internal("Missing multipart field 'metadataFile'".to_string())
    })?;

    Ok(ImportRequest {
        domain_id,
        xmi,
        overwrite,
        locale_files,
        acl,
    })
}

async fn read_text_field(field: axum::extract::multipart::Field<'_>) -> Result<String, MetadataError> {
    field
        .text()
        .await
        .map_err(|e| MetadataError::Internal(format!("Multipart field read failed: {}", e)))
}

async fn read_file_field(
    field: axum::extract::multipart::Field<'_>,
    default_name: &str,
) -> Result<UploadedFile, MetadataError> {
    let file_name = field
        .file_name()
        .filter(|n| !n.is_empty())
        .unwrap_or(default_name)
        .to_string();
    let content = field
        .bytes()
        .await
        .map_err(|e| MetadataError::Internal(format!("Multipart field read failed: {}", e)))?;
    Ok(UploadedFile { file_name, content })
}

// ============================================================================
// Handlers: GET/PUT /api/v1/metadata/{id}/acl
// ============================================================================

/// Handler for GET /api/v1/metadata/{id}/acl
///
/// # Response
///
/// - 200 OK: ACL descriptor
/// - 401 Unauthorized: access-control failure
/// - 409 Conflict: no files exist for the domain
#[instrument(skip(state), fields(domain_id = %domain_id))]
pub async fn get_domain_acl(
    State(state): State<Arc<AppState>>,
    Path(domain_id): Path<String>,
) -> Result<Json<AclDto>, MetadataError> {
    let acl = state.service.domain_acl(&domain_id).await?;
    Ok(Json(acl))
}

/// Handler for PUT /api/v1/metadata/{id}/acl
///
/// # Response
///
/// - 200 OK: ACL stored
/// - 401 Unauthorized: access-control failure
/// - 409 Conflict: no files exist for the domain
#[instrument(skip(state, acl), fields(domain_id = %domain_id))]
pub async fn set_domain_acl(
    State(state): State<Arc<AppState>>,
    Path(domain_id): Path<String>,
    Json(acl): Json<AclDto>,
) -> Result<StatusCode, MetadataError> {
    state.service.store_domain_acl(&domain_id, &acl).await?;
    Ok(StatusCode::OK)
}

// ============================================================================
// Handler: POST /api/v1/metadata/{id}/import-from-temp
// ============================================================================

/// Handler for POST /api/v1/metadata/{id}/import-from-temp
///
/// Imports a domain from files previously staged by the upload endpoint.
/// The request carries the serialized temp-file descriptor the upload
/// endpoint returned. Service failures propagate through the default
/// error mapping, with no per-operation interception.
///
/// # Response
///
/// - 200 OK, body `"200"`: imported
#[instrument(skip(state, request), fields(domain_id = %domain_id))]
pub async fn import_from_temp(
    State(state): State<Arc<AppState>>,
    Path(domain_id): Path<String>,
    Json(request): Json<ImportFromTempRequest>,
) -> Result<Response, MetadataError> {
    let files = TempFilesList::from_descriptor(&request.locale_files)
        .map_err(|e| MetadataError::Internal(format!("Invalid temp file descriptor: {}", e)))?;

    state
        .service
        .import_from_temp(&domain_id, &files, request.overwrite, request.acl.as_ref())
        .await?;

    info!(
        target: "metadata.handlers.import_from_temp",
        domain_id = %domain_id,
        "Domain imported from temp files"
    );
    Ok((StatusCode::OK, TEMP_IMPORT_SUCCESS_CODE).into_response())
}

// ============================================================================
// Handler: GET /api/v1/metadata/temp/{file}/contains-model
// ============================================================================

/// Handler for GET /api/v1/metadata/temp/{file}/contains-model
///
/// Reports whether a staged schema file carries a logical model, as
/// `"true"` or `"false"` in the body.
#[instrument(skip(state), fields(temp_file = %temp_file_name))]
pub async fn contains_model(
    State(state): State<Arc<AppState>>,
    Path(temp_file_name): Path<String>,
) -> Result<String, MetadataError> {
    let present = state.service.contains_model(&temp_file_name).await?;
    Ok(present.to_string())
}

// ============================================================================
// Handler: POST /api/v1/metadata/upload
// ============================================================================

/// Handler for POST /api/v1/metadata/upload
///
/// Stages a multipart upload (schema plus locale files) in the temp
/// directory. The body is the JSON serialization of the temp-file list
/// the service produced, returned unchanged.
#[instrument(skip_all, name = "metadata.handlers.upload")]
pub async fn upload_to_temp_dir(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Response, MetadataError> {
    let mut xmi: Option<UploadedFile> = None;
    let mut locale_files: Vec<UploadedFile> = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| MetadataError::Internal(format!("Multipart decode failed: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            FIELD_METADATA_FILE => {
                xmi = Some(read_file_field(field, "metadata.xmi").await?);
            }
            FIELD_LOCALE_FILES => {
                locale_files.push(read_file_field(field, "locale.properties").await?);
            }
            other => {
                warn!(
                    target: "metadata.handlers.upload",
                    field = %other,
                    "Ignoring unknown multipart field"
                );
            }
        }
    }

    let xmi = xmi.ok_or_else(|| {
        MetadataError::Internal("Missing multipart field 'metadataFile'".to_string())
    })?;

    let staged = state.service.stage_upload(xmi, locale_files).await?;
    let body = staged
        .to_json_string()
        .map_err(|e| MetadataError::Internal(format!("Temp file list serialization: {}", e)))?;

    Ok(([(CONTENT_TYPE, "application/json")], body).into_response())
}

// ============================================================================
// Helpers
// ============================================================================

/// Extract the bearer token from the Authorization header, if present.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[test]
    fn test_parse_overwrite_flag_truth_table() {
        // The legacy literal is truthy
        assert!(parse_overwrite_flag("overwrite"));
        assert!(parse_overwrite_flag("true"));
        assert!(parse_overwrite_flag("1"));
        assert!(parse_overwrite_flag(" yes "));

        assert!(!parse_overwrite_flag(""));
        assert!(!parse_overwrite_flag("   "));
        assert!(!parse_overwrite_flag("false"));
        assert!(!parse_overwrite_flag("FALSE"));
        assert!(!parse_overwrite_flag(" False "));
    }

    #[test]
    fn test_bearer_token_extraction() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert("authorization", "Bearer abc123".parse().unwrap());
        assert_eq!(bearer_token(&headers), Some("abc123"));

        headers.insert("authorization", "Basic abc123".parse().unwrap());
        assert_eq!(bearer_token(&headers), None);
    }

    #[test]
    fn test_build_attachment_single_file_is_raw() {
        let files = vec![DomainFile {
            name: "model.xmi".to_string(),
            content: Bytes::from_static(b"<xmi/>"),
        }];

        let response = build_attachment("steel-wheels", files).unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let disposition = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .unwrap()
            .to_str()
            .unwrap();
        assert_eq!(disposition, "attachment; filename=\"model.xmi\"");
    }

    #[test]
    fn test_build_attachment_multiple_files_is_zip() {
        let files = vec![
            DomainFile {
                name: "model.xmi".to_string(),
                content: Bytes::from_static(b"<xmi/>"),
            },
            DomainFile {
                name: "messages_en.properties".to_string(),
                content: Bytes::from_static(b"name=Steel Wheels"),
            },
        ];

        let response = build_attachment("steel-wheels", files).unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let disposition = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .unwrap()
            .to_str()
            .unwrap();
        assert_eq!(disposition, "attachment; filename=\"steel-wheels.zip\"");
    }

    #[test]
    fn test_zip_files_produces_readable_archive() {
        let files = vec![
            DomainFile {
                name: "model.xmi".to_string(),
                content: Bytes::from_static(b"<xmi/>"),
            },
            DomainFile {
                name: "messages_en.properties".to_string(),
                content: Bytes::from_static(b"name=Steel Wheels"),
            },
        ];

        let bytes = zip_files(&files).unwrap();
        let cursor = std::io::Cursor::new(bytes);
        let mut archive = zip::ZipArchive::new(cursor).unwrap();
        assert_eq!(archive.len(), 2);
        assert!(archive.by_name("model.xmi").is_ok());
        assert!(archive.by_name("messages_en.properties").is_ok());
    }
}
