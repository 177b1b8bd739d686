//! Authentication routing mode

use serde::{Deserialize, Serialize};

use crate::constants::{API_KEY_ROUTE, OAUTH_CLIENT_CREDS_ROUTE, OAUTH_PASS_THRU_ROUTE};

/// How requests are authenticated, and therefore which proxy route they use.
///
/// Fixed for the lifetime of a connector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMode {
    /// Per-project API key injected by the proxy.
    #[default]
    ApiKey,
    /// The caller's own OAuth token is forwarded.
    OAuthPassThrough,
    /// The proxy performs an OAuth client-credentials grant.
    OAuthClientCredentials,
}

impl AuthMode {
    /// Resolve the mode from the datasource's boolean settings.
    ///
    /// Pass-through takes precedence when both flags are set.
    #[must_use]
    pub const fn from_flags(oauth_pass_thru: bool, oauth_client_creds: bool) -> Self {
        match (oauth_pass_thru, oauth_client_creds) {
            (true, _) => Self::OAuthPassThrough,
            (false, true) => Self::OAuthClientCredentials,
            (false, false) => Self::ApiKey,
        }
    }

    /// `true` for both OAuth modes.
    #[must_use]
    pub const fn is_oauth(self) -> bool {
        !matches!(self, Self::ApiKey)
    }

    /// Proxy route segment for this mode.
    #[must_use]
    pub const fn route(self) -> &'static str {
        match self {
            Self::ApiKey => API_KEY_ROUTE,
            Self::OAuthPassThrough => OAUTH_PASS_THRU_ROUTE,
            Self::OAuthClientCredentials => OAUTH_CLIENT_CREDS_ROUTE,
        }
    }
}
