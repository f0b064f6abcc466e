//! API Key Verification
//! Shared-secret bearer token check for the sync API

/// The configured key set plus the auth-required policy flag.
///
/// Built once from [`crate::engine::config::AuthConfig`] and shared across
/// request handlers.
#[derive(Debug, Clone)]
pub struct ApiKeys {
    keys: Vec<String>,
    require_auth: bool,
}

impl ApiKeys {
    pub fn new(keys: Vec<String>, require_auth: bool) -> Self {
        Self { keys, require_auth }
    }

    /// Check an Authorization header value against the configured keys.
    ///
    /// A missing header is allowed unless `require_auth` is set. A present
    /// header must be `Bearer <token>` with a token exactly matching one of
    /// the configured keys.
    pub fn verify(&self, auth_header: Option<&str>) -> bool {
        match auth_header {
            None => !self.require_auth,
            Some(value) => match value.strip_prefix("Bearer ") {
                Some(token) => self.keys.iter().any(|key| key == token),
                None => false,
            },
        }
    }
}
