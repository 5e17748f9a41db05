//! Administrative capability check.
//!
//! The download endpoint must verify the caller may administer the system
//! before touching the metadata service. The check sits behind a trait so
//! tests can force either outcome without an authentication engine.

/// Decides whether a caller holds the administrative capability.
pub trait AdminAuthorizer: Send + Sync {
    /// `bearer_token` is the token from the `Authorization: Bearer` header,
    /// if one was sent.
    fn can_administer(&self, bearer_token: Option<&str>) -> bool;
}

/// Authorizer comparing the presented bearer token against the configured
/// admin token.
pub struct TokenAdminAuthorizer {
    admin_token: String,
}

impl TokenAdminAuthorizer {
    pub fn new(admin_token: String) -> Self {
        Self { admin_token }
    }
}

impl AdminAuthorizer for TokenAdminAuthorizer {
    fn can_administer(&self, bearer_token: Option<&str>) -> bool {
        match bearer_token {
            Some(token) => !self.admin_token.is_empty() && token == self.admin_token,
            None => false,
        }
    }
}

/// Stub authorizers for tests.
pub mod mock {
    use super::AdminAuthorizer;

    /// Grants the administrative capability to every caller.
    pub struct AllowAll;

    impl AdminAuthorizer for AllowAll {
        fn can_administer(&self, _bearer_token: Option<&str>) -> bool {
            true
        }
    }

    /// Denies the administrative capability to every caller.
    pub struct DenyAll;

    impl AdminAuthorizer for DenyAll {
        fn can_administer(&self, _bearer_token: Option<&str>) -> bool {
            false
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_token_authorizer_accepts_matching_token() {
        let authorizer = TokenAdminAuthorizer::new("s3cret".to_string());
        assert!(authorizer.can_administer(Some("s3cret")));
    }

    #[test]
    fn test_token_authorizer_rejects_wrong_token() {
        let authorizer = TokenAdminAuthorizer::new("s3cret".to_string());
        assert!(!authorizer.can_administer(Some("guess")));
    }

    #[test]
    fn test_token_authorizer_rejects_missing_token() {
        let authorizer = TokenAdminAuthorizer::new("s3cret".to_string());
        assert!(!authorizer.can_administer(None));
    }

    #[test]
    fn test_empty_configured_token_never_grants() {
        let authorizer = TokenAdminAuthorizer::new(String::new());
        assert!(!authorizer.can_administer(Some("")));
        assert!(!authorizer.can_administer(None));
    }
}
