//! Transport port
//!
//! The host owns the actual HTTP stack; the connector only needs "send one
//! request, get one response or error".

use async_trait::async_trait;
use cdf_connector_domain::{ConnectorError, ResponseEnvelope, Result, WireRequest};
use tracing::debug;

/// Single-shot request primitive supplied by the host.
///
/// Implementations must not retry. `Ok(None)` means the server answered with
/// an empty body.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send one request and wait for its response.
    async fn send(&self, request: WireRequest) -> Result<Option<ResponseEnvelope>>;
}

/// Send through `transport` and normalise the outcome.
///
/// An empty body becomes [`ConnectorError::NotFound`]; an envelope carrying
/// an `error` field becomes [`ConnectorError::Application`].
pub(crate) async fn dispatch(
    transport: &dyn Transport,
    request: WireRequest,
) -> Result<ResponseEnvelope> {
    let url = request.url.clone();
    debug!(url = %url, method = %request.method, "dispatching request");

    match transport.send(request).await? {
        None => Err(ConnectorError::NotFound(format!("{url} returned an empty body"))),
        Some(envelope) if envelope.error().is_some() => {
            Err(ConnectorError::Application(Box::new(envelope)))
        }
        Some(envelope) => Ok(envelope),
    }
}
