//! In-memory transport for tests
//!
//! Scripted responses are consumed in call order; once the script runs out
//! the optional responder answers. Every request is recorded so tests can
//! assert on exactly what was sent.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use cdf_connector_domain::{ConnectorError, ResponseEnvelope, Result, WireRequest};
use serde_json::Value;

use crate::transport_ports::Transport;

type Responder = Box<dyn Fn(&WireRequest) -> Result<Option<ResponseEnvelope>> + Send + Sync>;

/// Recording [`Transport`] double.
#[derive(Default)]
pub struct MockTransport {
    requests: Mutex<Vec<WireRequest>>,
    script: Mutex<VecDeque<Result<Option<ResponseEnvelope>>>>,
    responder: Option<Responder>,
    delay: Option<Duration>,
}

impl MockTransport {
    /// Transport with an empty script and no responder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every unscripted request with `responder`.
    pub fn with_responder<F>(responder: F) -> Self
    where
        F: Fn(&WireRequest) -> Result<Option<ResponseEnvelope>> + Send + Sync + 'static,
    {
        Self { responder: Some(Box::new(responder)), ..Self::default() }
    }

    /// Sleep for `delay` before answering, after recording the request.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Script a successful response.
    pub fn push_ok(&self, envelope: ResponseEnvelope) {
        self.push(Ok(Some(envelope)));
    }

    /// Script a full envelope given as JSON, e.g. `{ "data": { "items": [] } }`.
    ///
    /// A value that does not decode as an envelope is scripted as a
    /// `Serialization` failure instead.
    pub fn push_json(&self, envelope: Value) {
        self.push(serde_json::from_value(envelope).map(Some).map_err(ConnectorError::from));
    }

    /// Script a failure.
    pub fn push_err(&self, error: ConnectorError) {
        self.push(Err(error));
    }

    /// Script an empty response body.
    pub fn push_empty(&self) {
        self.push(Ok(None));
    }

    /// Number of requests sent so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Every request sent so far, in call order.
    #[must_use]
    pub fn requests(&self) -> Vec<WireRequest> {
        self.requests.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn push(&self, outcome: Result<Option<ResponseEnvelope>>) {
        self.script.lock().unwrap_or_else(PoisonError::into_inner).push_back(outcome);
    }

    fn next_outcome(&self, request: &WireRequest) -> Result<Option<ResponseEnvelope>> {
        let scripted = self.script.lock().unwrap_or_else(PoisonError::into_inner).pop_front();
        match (scripted, &self.responder) {
            (Some(outcome), _) => outcome,
            (None, Some(responder)) => responder(request),
            (None, None) => Err(ConnectorError::Internal(format!(
                "no scripted response for {} {}",
                request.method, request.url
            ))),
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: WireRequest) -> Result<Option<ResponseEnvelope>> {
        self.requests.lock().unwrap_or_else(PoisonError::into_inner).push(request.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.next_outcome(&request)
    }
}
