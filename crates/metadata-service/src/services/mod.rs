//! Service layer for the metadata endpoint.
//!
//! # Components
//!
//! - `metadata` - the `MetadataService` collaborator behind every handler,
//!   its filesystem-backed implementation, and the test mock
//! - `authorizer` - the administrative capability check

pub mod authorizer;
pub mod metadata;

pub use authorizer::{AdminAuthorizer, TokenAdminAuthorizer};
pub use metadata::{
    DomainFile, FsMetadataService, ImportRequest, MetadataService, UploadedFile,
    IMPORT_STATUS_DUPLICATE, IMPORT_STATUS_REJECTED,
};
