//! reqwest-backed [`Transport`]
//!
//! Maps a [`WireRequest`] onto one HTTP exchange and the response onto the
//! `{ status, data }` envelope the connector works with.

use std::time::Duration;

use async_trait::async_trait;
use cdf_connector_core::Transport;
use cdf_connector_domain::{
    ConnectorConfig, ConnectorError, HttpMethod, ResponseEnvelope, Result, TransportError,
    WireRequest,
};
use reqwest::{Method, StatusCode};
use serde_json::Value;
use tracing::{debug, warn};

use super::client::HttpClient;
use crate::errors::InfraError;

/// Header carrying the caller-supplied request id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

const USER_AGENT: &str = concat!("cdf-connector/", env!("CARGO_PKG_VERSION"));

/// HTTP transport for the datasource proxy.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: HttpClient,
}

impl HttpTransport {
    /// Transport over an already configured client.
    #[must_use]
    pub const fn new(client: HttpClient) -> Self {
        Self { client }
    }

    /// Build a transport with the configured request timeout and proxy
    /// handling.
    ///
    /// # Errors
    ///
    /// Returns an error when the underlying HTTP client cannot be built.
    pub fn from_config(config: &ConnectorConfig) -> Result<Self> {
        let client = HttpClient::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .user_agent(USER_AGENT)
            .system_proxy(config.use_system_proxy)
            .build()?;
        Ok(Self::new(client))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: WireRequest) -> Result<Option<ResponseEnvelope>> {
        let method = match request.method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
        };

        let mut builder = self.client.request(method, request.url.as_str());
        if let Some(params) = &request.params {
            builder = builder.query(params);
        }
        if let Some(request_id) = &request.request_id {
            builder = builder.header(REQUEST_ID_HEADER, request_id);
        }
        if let Some(data) = &request.data {
            builder = builder.json(data);
        }

        let response = self.client.send(builder).await?;
        let status = response.status();
        let body = response.text().await.map_err(|err| ConnectorError::from(InfraError::from(err)))?;

        if !status.is_success() {
            warn!(url = %request.url, %status, "request rejected");
            return Err(map_status_error(status, &request.url, body).into());
        }

        if body.trim().is_empty() {
            debug!(url = %request.url, %status, "empty response body");
            return Ok(None);
        }

        let data: Value = serde_json::from_str(&body)?;
        if data.is_null() {
            return Ok(None);
        }
        Ok(Some(ResponseEnvelope::new(data).with_status(status.as_u16())))
    }
}

fn map_status_error(status: StatusCode, url: &str, body: String) -> TransportError {
    let message = if body.is_empty() {
        format!("{url} returned status {status}")
    } else {
        format!("{url} returned status {status}: {body}")
    };

    let error = TransportError::with_status(status.as_u16(), message);
    if body.is_empty() {
        return error;
    }
    match serde_json::from_str::<Value>(&body) {
        Ok(json) => error.with_body(json),
        Err(_) => error.with_body(Value::String(body)),
    }
}
