//! Connector configuration

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_CACHE_TTL, DEFAULT_HTTP_TIMEOUT_SECS, DEFAULT_ITEMS_LIMIT};
use crate::types::AuthMode;

/// Settings for one connector instance (one configured datasource).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectorConfig {
    /// CDF project name; only used to build API-key routes
    pub project: String,
    /// Base URL of the datasource proxy
    pub base_url: String,
    /// Forward the caller's OAuth token
    #[serde(default)]
    pub oauth_pass_thru: bool,
    /// Let the proxy run a client-credentials grant
    #[serde(default)]
    pub oauth_client_creds: bool,
    /// Default lifetime of cached responses, e.g. `"10s"`
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl: String,
    /// Maximum `data.items` per request before chunking kicks in
    #[serde(default = "default_items_limit")]
    pub items_limit: usize,
    /// Upper bound on concurrently dispatched requests; unbounded when unset
    #[serde(default)]
    pub max_in_flight: Option<usize>,
    /// Per-request HTTP timeout in seconds
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
    /// Honour `HTTP_PROXY` / `HTTPS_PROXY` / `NO_PROXY` from the environment
    #[serde(default = "default_use_system_proxy")]
    pub use_system_proxy: bool,
}

impl ConnectorConfig {
    /// API-key settings with every default applied.
    pub fn new(project: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            base_url: base_url.into(),
            oauth_pass_thru: false,
            oauth_client_creds: false,
            cache_ttl: default_cache_ttl(),
            items_limit: default_items_limit(),
            max_in_flight: None,
            http_timeout_secs: default_http_timeout_secs(),
            use_system_proxy: default_use_system_proxy(),
        }
    }

    /// Forward the caller's OAuth token.
    #[must_use]
    pub fn with_oauth_pass_thru(mut self, enabled: bool) -> Self {
        self.oauth_pass_thru = enabled;
        self
    }

    /// Let the proxy run a client-credentials grant.
    #[must_use]
    pub fn with_oauth_client_creds(mut self, enabled: bool) -> Self {
        self.oauth_client_creds = enabled;
        self
    }

    /// Default cache lifetime, e.g. `"30s"`.
    #[must_use]
    pub fn with_cache_ttl(mut self, ttl: impl Into<String>) -> Self {
        self.cache_ttl = ttl.into();
        self
    }

    /// Bound concurrent dispatches.
    #[must_use]
    pub fn with_max_in_flight(mut self, limit: usize) -> Self {
        self.max_in_flight = Some(limit);
        self
    }

    /// Routing mode derived from the two OAuth flags.
    #[must_use]
    pub const fn auth_mode(&self) -> AuthMode {
        AuthMode::from_flags(self.oauth_pass_thru, self.oauth_client_creds)
    }
}

fn default_cache_ttl() -> String {
    DEFAULT_CACHE_TTL.to_string()
}

fn default_items_limit() -> usize {
    DEFAULT_ITEMS_LIMIT
}

fn default_http_timeout_secs() -> u64 {
    DEFAULT_HTTP_TIMEOUT_SECS
}

const fn default_use_system_proxy() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_defaults_applied_on_deserialize() {
        let config: ConnectorConfig =
            serde_json::from_value(json!({ "project": "p", "base_url": "https://proxy" }))
                .unwrap();

        assert_eq!(config, ConnectorConfig::new("p", "https://proxy"));
        assert_eq!(config.cache_ttl, "10s");
        assert_eq!(config.items_limit, 1000);
        assert_eq!(config.http_timeout_secs, 30);
        assert!(config.use_system_proxy);
        assert_eq!(config.auth_mode(), AuthMode::ApiKey);
    }

    #[test]
    fn test_auth_mode_from_flags() {
        let config = ConnectorConfig::new("p", "u").with_oauth_client_creds(true);
        assert_eq!(config.auth_mode(), AuthMode::OAuthClientCredentials);

        let config = config.with_oauth_pass_thru(true);
        assert_eq!(config.auth_mode(), AuthMode::OAuthPassThrough);
    }
}
