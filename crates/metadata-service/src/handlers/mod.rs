//! HTTP request handlers.

pub mod health;
pub mod metadata;
pub mod metrics;

pub use health::health_check;
pub use metadata::{
    contains_model, delete_domain, download_domain, get_domain_acl, import_domain_legacy,
    import_from_temp, list_domains, set_domain_acl, upload_to_temp_dir,
};
pub use metrics::metrics_handler;
