//! Error types used throughout the connector
//!
//! Errors are `Clone + PartialEq`: a single failed dispatch may be observed by
//! several callers at once (cache followers, chunk fan-out), and each of them
//! must see exactly the value the transport produced.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::types::ResponseEnvelope;

/// Failure reported by the transport (network error or non-success status).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransportError {
    /// HTTP status, when the server answered at all
    pub status: Option<u16>,
    /// Human-readable failure description
    pub message: String,
    /// Response body, when one was returned
    pub body: Option<Value>,
}

impl TransportError {
    /// Failure without an HTTP status (connect error, timeout).
    pub fn new(message: impl Into<String>) -> Self {
        Self { status: None, message: message.into(), body: None }
    }

    /// Failure carrying the HTTP status the server answered with.
    pub fn with_status(status: u16, message: impl Into<String>) -> Self {
        Self { status: Some(status), message: message.into(), body: None }
    }

    /// Attach the response body.
    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "{} (status {status})", self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// Main error type for the connector
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConnectorError {
    /// Network failure or non-success HTTP status
    #[error("Transport error: {0}")]
    Transport(TransportError),

    /// A successful HTTP exchange whose envelope carries an `error` field.
    #[error("Application error: {}", application_message(.0))]
    Application(Box<ResponseEnvelope>),

    /// The transport produced no body
    #[error("Not found: {0}")]
    NotFound(String),

    /// The request cannot be dispatched as given
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Rejected connector settings
    #[error("Configuration error: {0}")]
    Config(String),

    /// A payload could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Broken internal invariant
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ConnectorError {
    /// `true` for the empty-body outcome.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// HTTP status attached to a transport failure, if any.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Transport(err) => err.status,
            Self::Application(envelope) => envelope.status,
            _ => None,
        }
    }
}

impl From<TransportError> for ConnectorError {
    fn from(err: TransportError) -> Self {
        Self::Transport(err)
    }
}

impl From<serde_json::Error> for ConnectorError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

fn application_message(envelope: &ResponseEnvelope) -> String {
    match envelope.error() {
        Some(Value::Object(fields)) => match fields.get("message") {
            Some(Value::String(message)) => message.clone(),
            Some(other) => other.to_string(),
            None => Value::Object(fields.clone()).to_string(),
        },
        Some(Value::String(message)) => message.clone(),
        Some(other) => other.to_string(),
        None => "envelope reported an error".to_string(),
    }
}

/// Result type alias for connector operations
pub type Result<T> = std::result::Result<T, ConnectorError>;
