//! Route resolution
//!
//! Every logical path is turned into a proxy URL according to the
//! connector's [`AuthMode`]:
//!
//! | Mode | URL |
//! |------|-----|
//! | `ApiKey` | `{base}/cdf-api-key/api/v1/projects/{project}{path}` |
//! | `OAuthPassThrough` | `{base}/cdf-oauth/{path}` |
//! | `OAuthClientCredentials` | `{base}/cdf-cc-oauth/{path}` |

use cdf_connector_domain::constants::API_V1;
use cdf_connector_domain::{AuthMode, ConnectorConfig, RequestDescriptor, WireRequest};

/// Build the full URL for `path`. Pure and infallible.
#[must_use]
pub fn resolve_route(project: &str, base_url: &str, auth_mode: AuthMode, path: &str) -> String {
    match auth_mode {
        AuthMode::ApiKey => {
            format!("{base_url}/{}/{API_V1}/{project}{path}", auth_mode.route())
        }
        AuthMode::OAuthPassThrough | AuthMode::OAuthClientCredentials => {
            format!("{base_url}/{}/{path}", auth_mode.route())
        }
    }
}

/// Route resolver bound to one datasource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteResolver {
    project: String,
    base_url: String,
    auth_mode: AuthMode,
}

impl RouteResolver {
    /// Resolver for an explicit project, base URL and mode.
    pub fn new(project: impl Into<String>, base_url: impl Into<String>, auth_mode: AuthMode) -> Self {
        Self { project: project.into(), base_url: base_url.into(), auth_mode }
    }

    /// Resolver for a configured datasource.
    #[must_use]
    pub fn from_config(config: &ConnectorConfig) -> Self {
        Self::new(config.project.clone(), config.base_url.clone(), config.auth_mode())
    }

    /// Routing mode.
    #[must_use]
    pub const fn auth_mode(&self) -> AuthMode {
        self.auth_mode
    }

    /// CDF project used by API-key routes.
    #[must_use]
    pub fn project(&self) -> &str {
        &self.project
    }

    /// Full URL for `path`.
    #[must_use]
    pub fn resolve(&self, path: &str) -> String {
        resolve_route(&self.project, &self.base_url, self.auth_mode, path)
    }

    /// Resolve `request.path` and produce the transport-level request.
    #[must_use]
    pub fn wire(&self, request: RequestDescriptor) -> WireRequest {
        let url = self.resolve(&request.path);
        request.into_wire(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROTOCOL: &str = "protocol:/";

    #[test]
    fn test_api_key_route_includes_project() {
        let resolver = RouteResolver::new("test", PROTOCOL, AuthMode::ApiKey);
        assert_eq!(resolver.resolve("/ø"), "protocol://cdf-api-key/api/v1/projects/test/ø");
        assert_eq!(resolver.resolve(""), "protocol://cdf-api-key/api/v1/projects/test");
    }

    #[test]
    fn test_oauth_routes_ignore_project() {
        assert_eq!(
            resolve_route("test", PROTOCOL, AuthMode::OAuthPassThrough, ""),
            "protocol://cdf-oauth/"
        );
        assert_eq!(
            resolve_route("test", PROTOCOL, AuthMode::OAuthClientCredentials, ""),
            "protocol://cdf-cc-oauth/"
        );
        assert_eq!(
            resolve_route("test", PROTOCOL, AuthMode::OAuthPassThrough, "api/v1/token/inspect"),
            "protocol://cdf-oauth/api/v1/token/inspect"
        );
    }

    #[test]
    fn test_from_config_and_wire() {
        let config = ConnectorConfig::new("test", PROTOCOL).with_oauth_client_creds(true);
        let resolver = RouteResolver::from_config(&config);
        assert_eq!(resolver.auth_mode(), AuthMode::OAuthClientCredentials);
        assert_eq!(resolver.project(), "test");

        let wire = resolver.wire(RequestDescriptor::get("assets"));
        assert_eq!(wire.url, "protocol://cdf-cc-oauth/assets");
    }
}
