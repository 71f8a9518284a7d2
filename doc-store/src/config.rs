//! Store client configuration

use crate::DEFAULT_MAX_BATCH_OPS;

/// Default REST endpoint of the hosted document store
pub const DEFAULT_BASE_URL: &str = "https://firestore.googleapis.com/v1";

/// Configuration for connecting to the remote document store
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// REST base URL (e.g., "https://firestore.googleapis.com/v1")
    pub base_url: String,

    /// Project that owns the database
    pub project_id: String,

    /// Database id inside the project
    pub database: String,

    /// OAuth bearer token for authentication
    pub token: Option<String>,

    /// Web API key, sent as the `key` query parameter
    pub api_key: Option<String>,

    /// Request timeout in milliseconds
    pub timeout_ms: u64,

    /// Per-commit operation ceiling
    pub max_batch_ops: usize,
}

impl StoreConfig {
    /// Create a configuration for a project using the default endpoint
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            project_id: project_id.into(),
            database: "(default)".to_string(),
            token: None,
            api_key: None,
            timeout_ms: 30_000,
            max_batch_ops: DEFAULT_MAX_BATCH_OPS,
        }
    }

    /// Point at a different endpoint (emulator, proxy)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    /// Set the bearer token
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Set the web API key
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set the request timeout
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_max_batch_ops(mut self, max_batch_ops: usize) -> Self {
        self.max_batch_ops = max_batch_ops;
        self
    }

    /// Resource name prefix of every document,
    /// `projects/{project}/databases/{database}/documents`
    pub fn documents_root(&self) -> String {
        format!(
            "projects/{}/databases/{}/documents",
            self.project_id, self.database
        )
    }

    /// Full URL of the documents root
    pub fn documents_url(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.documents_root()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_documents_url() {
        let config = StoreConfig::new("shop-admin").with_base_url("http://localhost:8080/v1/");
        assert_eq!(
            config.documents_url(),
            "http://localhost:8080/v1/projects/shop-admin/databases/(default)/documents"
        );
    }

    #[test]
    fn test_defaults() {
        let config = StoreConfig::new("p");
        assert_eq!(config.max_batch_ops, 500);
        assert_eq!(config.timeout_ms, 30_000);
        assert!(config.token.is_none());
    }
}
