//! Conversions from external infrastructure errors into connector errors.

use cdf_connector_domain::{ConnectorError, TransportError};
use reqwest::Error as HttpError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub ConnectorError);

impl From<InfraError> for ConnectorError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<ConnectorError> for InfraError {
    fn from(value: ConnectorError) -> Self {
        Self(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoConnectorError {
    fn into_connector(self) -> ConnectorError;
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → ConnectorError */
/* -------------------------------------------------------------------------- */

impl IntoConnectorError for HttpError {
    fn into_connector(self) -> ConnectorError {
        if self.is_builder() {
            return ConnectorError::InvalidRequest(format!("cannot build HTTP request: {self}"));
        }

        if self.is_timeout() {
            return TransportError::new("HTTP request timed out").into();
        }

        #[cfg(not(target_arch = "wasm32"))]
        if self.is_connect() {
            return TransportError::new(format!("HTTP connection failure: {self}")).into();
        }

        if self.is_decode() {
            return ConnectorError::Serialization(format!("invalid response body: {self}"));
        }

        if let Some(status) = self.status() {
            let code = status.as_u16();
            let reason = status.canonical_reason().unwrap_or("unknown status");
            let message = format!("HTTP {code} {reason}");
            return TransportError::with_status(code, message).into();
        }

        TransportError::new(self.to_string()).into()
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        Self(value.into_connector())
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
