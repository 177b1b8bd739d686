//! Datasource health check
//!
//! Used by the datasource configuration page: calls the login endpoint that
//! matches the connector's auth mode and reports whether the credentials are
//! valid and can reach the configured project.

use cdf_connector_common::time::Clock;
use cdf_connector_domain::constants::{LOGIN_STATUS_PATH, TOKEN_INSPECT_PATH};
use cdf_connector_domain::{RequestDescriptor, ResponseEnvelope};
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::connector::Connector;

/// Overall outcome of a health check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Logged in with access to the project
    Success,
    /// Logged in, but the project is not reachable
    Warning,
    /// Credentials rejected or the login call failed
    Error,
}

/// Health check result in the shape the configuration page renders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[allow(missing_docs)]
pub struct HealthCheckResult {
    pub status: HealthStatus,
    pub title: String,
    pub message: String,
}

impl HealthCheckResult {
    fn new(status: HealthStatus, title: &str, message: impl Into<String>) -> Self {
        Self { status, title: title.to_string(), message: message.into() }
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct LoginStatus {
    has_access_to_project: bool,
    is_logged_in: bool,
}

/// Check the datasource. Never fails: transport errors are reported as
/// invalid credentials.
pub async fn test_datasource<C: Clock>(connector: &Connector<C>) -> HealthCheckResult {
    let login = if connector.is_using_oauth() {
        check_login_status_oauth(connector).await
    } else {
        check_login_status_api_key(connector).await
    };

    let project = connector.project();
    let result = match (login.is_logged_in, login.has_access_to_project) {
        (true, true) => {
            HealthCheckResult::new(HealthStatus::Success, "Success", "Your Cognite credentials are valid")
        }
        (true, false) => HealthCheckResult::new(
            HealthStatus::Warning,
            "Warning",
            format!("Cannot access '{project}' project"),
        ),
        _ => HealthCheckResult::new(
            HealthStatus::Error,
            "Error",
            "Your Cognite credentials are invalid",
        ),
    };

    info!(project, status = ?result.status, "datasource health check finished");
    result
}

async fn check_login_status_api_key<C: Clock>(connector: &Connector<C>) -> LoginStatus {
    let Some(envelope) = login_call(connector, LOGIN_STATUS_PATH).await else {
        return LoginStatus::default();
    };

    let body = envelope.data.get("data");
    let project = body.and_then(|data| data.get("project")).and_then(Value::as_str);
    LoginStatus {
        has_access_to_project: project == Some(connector.project()),
        is_logged_in: body.and_then(|data| data.get("loggedIn")).and_then(Value::as_bool)
            == Some(true),
    }
}

async fn check_login_status_oauth<C: Clock>(connector: &Connector<C>) -> LoginStatus {
    let Some(envelope) = login_call(connector, TOKEN_INSPECT_PATH).await else {
        return LoginStatus::default();
    };

    let has_access_to_project = envelope
        .data
        .get("projects")
        .and_then(Value::as_array)
        .is_some_and(|projects| {
            projects.iter().any(|project| {
                project.get("projectUrlName").and_then(Value::as_str) == Some(connector.project())
            })
        });
    LoginStatus { has_access_to_project, is_logged_in: true }
}

/// The login call's envelope when it answered with status 200.
async fn login_call<C: Clock>(connector: &Connector<C>, path: &str) -> Option<ResponseEnvelope> {
    match connector.request(RequestDescriptor::get(path)).await {
        Ok(envelope) if envelope.status == Some(200) => Some(envelope),
        Ok(envelope) => {
            warn!(path, status = ?envelope.status, "login check returned unexpected status");
            None
        }
        Err(e) => {
            warn!(path, error = %e, "login check failed");
            None
        }
    }
}
