//! Metadata domain service.
//!
//! The `MetadataService` trait is the single collaborator behind the HTTP
//! endpoint: every handler delegates here and only translates outcomes to
//! responses. The filesystem-backed implementation keeps domains under a
//! configured storage directory; tests substitute the mock below.

use crate::errors::MetadataError;
use crate::models::{AclDto, TempFilesList};
use bytes::Bytes;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{info, instrument, warn};

/// ACL sidecar file name inside a domain directory.
const ACL_FILE_NAME: &str = "acl.json";

/// Marker distinguishing schema files that carry a logical model.
const MODEL_MARKER: &str = "LogicalModel";

/// Import sub-status for a duplicate domain (recoverable, legacy code 1).
pub const IMPORT_STATUS_DUPLICATE: i32 = 1;

/// Import sub-status for a rejected artifact (fatal, legacy code 10).
pub const IMPORT_STATUS_REJECTED: i32 = 10;

/// A file belonging to a domain, as served by the download endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainFile {
    /// File name within the domain.
    pub name: String,

    /// Raw file content.
    pub content: Bytes,
}

/// An uploaded file extracted from a multipart request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    /// Client-supplied file name.
    pub file_name: String,

    /// Raw file content.
    pub content: Bytes,
}

/// A legacy one-shot import: schema plus locale files in a single call.
#[derive(Debug, Clone)]
pub struct ImportRequest {
    /// Target domain id.
    pub domain_id: String,

    /// Schema (XMI) file.
    pub xmi: UploadedFile,

    /// Whether an existing domain may be replaced.
    pub overwrite: bool,

    /// Locale properties files accompanying the schema.
    pub locale_files: Vec<UploadedFile>,

    /// Optional ACL to apply after import.
    pub acl: Option<AclDto>,
}

/// Operations the endpoint delegates to (enables mocking).
#[async_trait::async_trait]
pub trait MetadataService: Send + Sync {
    /// All files belonging to a domain, for download.
    async fn domain_files(&self, domain_id: &str) -> Result<Vec<DomainFile>, MetadataError>;

    /// Remove a domain and its files.
    async fn remove_domain(&self, domain_id: &str) -> Result<(), MetadataError>;

    /// Ids of all known domains.
    async fn list_domain_ids(&self) -> Result<Vec<String>, MetadataError>;

    /// One-shot legacy import of a schema plus locale files.
    async fn import_domain(&self, request: ImportRequest) -> Result<(), MetadataError>;

    /// Read the ACL associated with a domain.
    async fn domain_acl(&self, domain_id: &str) -> Result<AclDto, MetadataError>;

    /// Replace the ACL associated with a domain.
    async fn store_domain_acl(&self, domain_id: &str, acl: &AclDto) -> Result<(), MetadataError>;

    /// Import a domain from files previously staged in the temp directory.
    async fn import_from_temp(
        &self,
        domain_id: &str,
        files: &TempFilesList,
        overwrite: bool,
        acl: Option<&AclDto>,
    ) -> Result<(), MetadataError>;

    /// Whether a staged schema file carries a logical model.
    async fn contains_model(&self, temp_file_name: &str) -> Result<bool, MetadataError>;

    /// Stage uploaded files in the temp directory pending import.
    async fn stage_upload(
        &self,
        xmi: UploadedFile,
        locale_files: Vec<UploadedFile>,
    ) -> Result<TempFilesList, MetadataError>;
}

/// Filesystem-backed metadata service.
///
/// Layout: `<storage_dir>/domains/<id>/` holds a domain's files plus an
/// `acl.json` sidecar; `<storage_dir>/tmp/` holds staged uploads.
pub struct FsMetadataService {
    storage_dir: PathBuf,
    temp_seq: AtomicU64,
}

impl FsMetadataService {
    /// Create a service rooted at `storage_dir`, creating the layout if needed.
    pub async fn new(storage_dir: PathBuf) -> Result<Self, MetadataError> {
        tokio::fs::create_dir_all(storage_dir.join("domains")).await?;
        tokio::fs::create_dir_all(storage_dir.join("tmp")).await?;
        Ok(Self {
            storage_dir,
            temp_seq: AtomicU64::new(1),
        })
    }

    fn domains_dir(&self) -> PathBuf {
        self.storage_dir.join("domains")
    }

    fn temp_dir(&self) -> PathBuf {
        self.storage_dir.join("tmp")
    }

    /// Resolve a domain directory, rejecting ids that escape the root.
    fn domain_dir(&self, domain_id: &str) -> Result<PathBuf, MetadataError> {
        validate_artifact_name(domain_id)?;
        Ok(self.domains_dir().join(domain_id))
    }

    /// Resolve a staged temp file, rejecting names that escape the root.
    fn temp_file_path(&self, temp_file_name: &str) -> Result<PathBuf, MetadataError> {
        validate_artifact_name(temp_file_name)?;
        Ok(self.temp_dir().join(temp_file_name))
    }

    fn next_temp_name(&self, original: &str) -> String {
        let seq = self.temp_seq.fetch_add(1, Ordering::SeqCst);
        format!("tmp-{:08}-{}", seq, sanitize_file_name(original))
    }

    async fn write_domain_files(
        &self,
        dir: &Path,
        xmi_name: &str,
        xmi_content: &[u8],
        locale_files: &[(String, Bytes)],
    ) -> Result<(), MetadataError> {
        tokio::fs::create_dir_all(dir).await?;
        tokio::fs::write(dir.join(sanitize_file_name(xmi_name)), xmi_content).await?;
        for (name, content) in locale_files {
            tokio::fs::write(dir.join(sanitize_file_name(name)), content).await?;
        }
        Ok(())
    }
}

/// Reject artifact names that could traverse outside the storage root.
fn validate_artifact_name(name: &str) -> Result<(), MetadataError> {
    if name.is_empty()
        || name.contains('/')
        || name.contains('\\')
        || name.contains("..")
        || name == ACL_FILE_NAME
    {
        return Err(MetadataError::Internal(format!(
            "Invalid artifact name: '{}'",
            name
        )));
    }
    Ok(())
}

/// Strip any path components from a client-supplied file name.
fn sanitize_file_name(name: &str) -> String {
    name.rsplit(['/', '\\'])
        .next()
        .unwrap_or(name)
        .replace("..", "_")
}

#[async_trait::async_trait]
impl MetadataService for FsMetadataService {
    #[instrument(skip(self), fields(domain_id = %domain_id))]
    async fn domain_files(&self, domain_id: &str) -> Result<Vec<DomainFile>, MetadataError> {
        let dir = self.domain_dir(domain_id)?;
        let mut entries = tokio::fs::read_dir(&dir).await?;

        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if name == ACL_FILE_NAME {
                continue;
            }
            let content = tokio::fs::read(entry.path()).await?;
            files.push(DomainFile {
                name,
                content: Bytes::from(content),
            });
        }

        if files.is_empty() {
            return Err(MetadataError::DomainNotFound(domain_id.to_string()));
        }

        files.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(files)
    }

    #[instrument(skip(self), fields(domain_id = %domain_id))]
    async fn remove_domain(&self, domain_id: &str) -> Result<(), MetadataError> {
        let dir = self.domain_dir(domain_id)?;
        tokio::fs::remove_dir_all(&dir).await?;
        info!(target: "metadata.service", domain_id = %domain_id, "Domain removed");
        Ok(())
    }

    async fn list_domain_ids(&self) -> Result<Vec<String>, MetadataError> {
        let mut entries = tokio::fs::read_dir(self.domains_dir()).await?;
        let mut ids = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_dir() {
                ids.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        ids.sort();
        Ok(ids)
    }

    #[instrument(skip(self, request), fields(domain_id = %request.domain_id))]
    async fn import_domain(&self, request: ImportRequest) -> Result<(), MetadataError> {
        let dir = self.domain_dir(&request.domain_id)?;

        if request.xmi.content.is_empty() {
            return Err(MetadataError::Import {
                status: IMPORT_STATUS_REJECTED,
                message: format!("Empty schema file '{}'", request.xmi.file_name),
            });
        }

        if !request.overwrite && tokio::fs::try_exists(&dir).await? {
            return Err(MetadataError::Import {
                status: IMPORT_STATUS_DUPLICATE,
                message: format!("Domain '{}' already exists", request.domain_id),
            });
        }

        let locale_files: Vec<(String, Bytes)> = request
            .locale_files
            .iter()
            .map(|f| (f.file_name.clone(), f.content.clone()))
            .collect();
        self.write_domain_files(
            &dir,
            &request.xmi.file_name,
            &request.xmi.content,
            &locale_files,
        )
        .await?;

        if let Some(acl) = &request.acl {
            self.store_domain_acl(&request.domain_id, acl).await?;
        }

        info!(
            target: "metadata.service",
            domain_id = %request.domain_id,
            locale_files = request.locale_files.len(),
            "Domain imported"
        );
        Ok(())
    }

    #[instrument(skip(self), fields(domain_id = %domain_id))]
    async fn domain_acl(&self, domain_id: &str) -> Result<AclDto, MetadataError> {
        let dir = self.domain_dir(domain_id)?;
        let raw = tokio::fs::read(dir.join(ACL_FILE_NAME)).await?;
        serde_json::from_slice(&raw)
            .map_err(|e| MetadataError::Internal(format!("Corrupt ACL for '{}': {}", domain_id, e)))
    }

    #[instrument(skip(self, acl), fields(domain_id = %domain_id))]
    async fn store_domain_acl(&self, domain_id: &str, acl: &AclDto) -> Result<(), MetadataError> {
        let dir = self.domain_dir(domain_id)?;
        if !tokio::fs::try_exists(&dir).await? {
            return Err(MetadataError::DomainNotFound(domain_id.to_string()));
        }
        let raw = serde_json::to_vec(acl)
            .map_err(|e| MetadataError::Internal(format!("ACL serialization failed: {}", e)))?;
        tokio::fs::write(dir.join(ACL_FILE_NAME), raw).await?;
        Ok(())
    }

    #[instrument(skip(self, files, acl), fields(domain_id = %domain_id))]
    async fn import_from_temp(
        &self,
        domain_id: &str,
        files: &TempFilesList,
        overwrite: bool,
        acl: Option<&AclDto>,
    ) -> Result<(), MetadataError> {
        let dir = self.domain_dir(domain_id)?;

        let xmi_name = files.xmi_file_name.as_deref().ok_or_else(|| {
            MetadataError::Internal("Temp file list has no schema file".to_string())
        })?;

        if !overwrite && tokio::fs::try_exists(&dir).await? {
            return Err(MetadataError::Import {
                status: IMPORT_STATUS_DUPLICATE,
                message: format!("Domain '{}' already exists", domain_id),
            });
        }

        let xmi_content = tokio::fs::read(self.temp_file_path(xmi_name)?).await?;

        let mut locale_files = Vec::new();
        for bundle in &files.bundles {
            let temp_name = bundle.temp_file_name.as_deref().ok_or_else(|| {
                MetadataError::Internal(format!(
                    "Locale file '{}' was never staged",
                    bundle.original_file_name
                ))
            })?;
            let content = tokio::fs::read(self.temp_file_path(temp_name)?).await?;
            locale_files.push((bundle.original_file_name.clone(), Bytes::from(content)));
        }

        self.write_domain_files(&dir, xmi_name, &xmi_content, &locale_files)
            .await?;

        if let Some(acl) = acl {
            self.store_domain_acl(domain_id, acl).await?;
        }

        info!(target: "metadata.service", domain_id = %domain_id, "Domain imported from temp");
        Ok(())
    }

    async fn contains_model(&self, temp_file_name: &str) -> Result<bool, MetadataError> {
        let content = tokio::fs::read(self.temp_file_path(temp_file_name)?).await?;
        Ok(String::from_utf8_lossy(&content).contains(MODEL_MARKER))
    }

    #[instrument(skip(self, xmi, locale_files))]
    async fn stage_upload(
        &self,
        xmi: UploadedFile,
        locale_files: Vec<UploadedFile>,
    ) -> Result<TempFilesList, MetadataError> {
        let xmi_temp_name = self.next_temp_name(&xmi.file_name);
        tokio::fs::write(self.temp_dir().join(&xmi_temp_name), &xmi.content).await?;

        let mut bundles = Vec::with_capacity(locale_files.len());
        for file in &locale_files {
            let temp_name = self.next_temp_name(&file.file_name);
            tokio::fs::write(self.temp_dir().join(&temp_name), &file.content).await?;
            bundles.push(crate::models::LocaleFileBundle {
                original_file_name: file.file_name.clone(),
                temp_file_name: Some(temp_name),
            });
        }

        if locale_files.is_empty() {
            warn!(
                target: "metadata.service",
                file = %xmi.file_name,
                "Schema staged without locale files"
            );
        }

        Ok(TempFilesList {
            xmi_file_name: Some(xmi_temp_name),
            bundles,
        })
    }
}

/// Mock metadata service module for testing.
///
/// Provides a configurable stand-in for the endpoint's collaborator so
/// handler and integration tests can force each outcome the mapping layer
/// must translate.
pub mod mock {

    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Mock metadata service with per-operation outcomes.
    ///
    /// Every operation succeeds with empty data by default; `with_*`
    /// builders override individual outcomes. Call counts are tracked
    /// per operation.
    #[derive(Default)]
    pub struct MockMetadataService {
        files: Vec<DomainFile>,
        files_error: Option<MetadataError>,
        remove_error: Option<MetadataError>,
        domain_ids: Vec<String>,
        import_error: Option<MetadataError>,
        acl: AclDto,
        acl_error: Option<MetadataError>,
        store_acl_error: Option<MetadataError>,
        import_from_temp_error: Option<MetadataError>,
        model_present: bool,
        staged: TempFilesList,
        stage_error: Option<MetadataError>,
        calls: CallCounts,
    }

    /// Per-operation call counters.
    #[derive(Default)]
    pub struct CallCounts {
        pub domain_files: AtomicUsize,
        pub remove_domain: AtomicUsize,
        pub list_domain_ids: AtomicUsize,
        pub import_domain: AtomicUsize,
        pub domain_acl: AtomicUsize,
        pub store_domain_acl: AtomicUsize,
        pub import_from_temp: AtomicUsize,
        pub contains_model: AtomicUsize,
        pub stage_upload: AtomicUsize,
    }

    impl MockMetadataService {
        /// Create a mock where every operation succeeds with empty data.
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_files(mut self, files: Vec<DomainFile>) -> Self {
            self.files = files;
            self
        }

        pub fn with_files_error(mut self, error: MetadataError) -> Self {
            self.files_error = Some(error);
            self
        }

        pub fn with_remove_error(mut self, error: MetadataError) -> Self {
            self.remove_error = Some(error);
            self
        }

        pub fn with_domain_ids(mut self, ids: Vec<String>) -> Self {
            self.domain_ids = ids;
            self
        }

        pub fn with_import_error(mut self, error: MetadataError) -> Self {
            self.import_error = Some(error);
            self
        }

        pub fn with_acl(mut self, acl: AclDto) -> Self {
            self.acl = acl;
            self
        }

        pub fn with_acl_error(mut self, error: MetadataError) -> Self {
            self.acl_error = Some(error);
            self
        }

        pub fn with_store_acl_error(mut self, error: MetadataError) -> Self {
            self.store_acl_error = Some(error);
            self
        }

        pub fn with_import_from_temp_error(mut self, error: MetadataError) -> Self {
            self.import_from_temp_error = Some(error);
            self
        }

        pub fn with_model_present(mut self, present: bool) -> Self {
            self.model_present = present;
            self
        }

        pub fn with_staged(mut self, staged: TempFilesList) -> Self {
            self.staged = staged;
            self
        }

        pub fn with_stage_error(mut self, error: MetadataError) -> Self {
            self.stage_error = Some(error);
            self
        }

        /// Call counters for assertions.
        pub fn calls(&self) -> &CallCounts {
            &self.calls
        }
    }

    fn outcome<T: Clone>(error: &Option<MetadataError>, value: &T) -> Result<T, MetadataError> {
        match error {
            Some(e) => Err(e.clone()),
            None => Ok(value.clone()),
        }
    }

    #[async_trait::async_trait]
    impl MetadataService for MockMetadataService {
        async fn domain_files(&self, _domain_id: &str) -> Result<Vec<DomainFile>, MetadataError> {
            self.calls.domain_files.fetch_add(1, Ordering::SeqCst);
            outcome(&self.files_error, &self.files)
        }

        async fn remove_domain(&self, _domain_id: &str) -> Result<(), MetadataError> {
            self.calls.remove_domain.fetch_add(1, Ordering::SeqCst);
            outcome(&self.remove_error, &())
        }

        async fn list_domain_ids(&self) -> Result<Vec<String>, MetadataError> {
            self.calls.list_domain_ids.fetch_add(1, Ordering::SeqCst);
            Ok(self.domain_ids.clone())
        }

        async fn import_domain(&self, _request: ImportRequest) -> Result<(), MetadataError> {
            self.calls.import_domain.fetch_add(1, Ordering::SeqCst);
            outcome(&self.import_error, &())
        }

        async fn domain_acl(&self, _domain_id: &str) -> Result<AclDto, MetadataError> {
            self.calls.domain_acl.fetch_add(1, Ordering::SeqCst);
            outcome(&self.acl_error, &self.acl)
        }

        async fn store_domain_acl(
            &self,
            _domain_id: &str,
            _acl: &AclDto,
        ) -> Result<(), MetadataError> {
            self.calls.store_domain_acl.fetch_add(1, Ordering::SeqCst);
            outcome(&self.store_acl_error, &())
        }

        async fn import_from_temp(
            &self,
            _domain_id: &str,
            _files: &TempFilesList,
            _overwrite: bool,
            _acl: Option<&AclDto>,
        ) -> Result<(), MetadataError> {
            self.calls.import_from_temp.fetch_add(1, Ordering::SeqCst);
            outcome(&self.import_from_temp_error, &())
        }

        async fn contains_model(&self, _temp_file_name: &str) -> Result<bool, MetadataError> {
            self.calls.contains_model.fetch_add(1, Ordering::SeqCst);
            Ok(self.model_present)
        }

        async fn stage_upload(
            &self,
            _xmi: UploadedFile,
            _locale_files: Vec<UploadedFile>,
        ) -> Result<TempFilesList, MetadataError> {
            self.calls.stage_upload.fetch_add(1, Ordering::SeqCst);
            outcome(&self.stage_error, &self.staged)
        }
    }

    #[cfg(test)]
    #[allow(clippy::unwrap_used, clippy::expect_used)]
    mod tests {
        use super::*;

        #[tokio::test]
        async fn test_mock_defaults_succeed() {
            let mock = MockMetadataService::new();
            assert!(mock.remove_domain("d").await.is_ok());
            assert!(mock.list_domain_ids().await.unwrap().is_empty());
            assert_eq!(mock.calls().remove_domain.load(Ordering::SeqCst), 1);
        }

        #[tokio::test]
        async fn test_mock_configured_error() {
            let mock = MockMetadataService::new()
                .with_remove_error(MetadataError::AccessDenied("no".to_string()));
            let result = mock.remove_domain("d").await;
            assert!(matches!(result, Err(MetadataError::AccessDenied(_))));
        }

        #[tokio::test]
        async fn test_mock_staged_passthrough() {
            let staged = TempFilesList {
                xmi_file_name: Some("tmp-1.xmi".to_string()),
                bundles: vec![],
            };
            let mock = MockMetadataService::new().with_staged(staged.clone());
            let xmi = UploadedFile {
                file_name: "model.xmi".to_string(),
                content: Bytes::from_static(b"x"),
            };
            assert_eq!(mock.stage_upload(xmi, vec![]).await.unwrap(), staged);
        }
    }
}
