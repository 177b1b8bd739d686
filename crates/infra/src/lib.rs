//! # CDF Connector Infrastructure
//!
//! Infrastructure implementations of core ports.
//!
//! This crate contains:
//! - The reqwest-based HTTP transport
//! - Configuration loading from environment and files
//! - Logging setup
//!
//! ## Architecture
//! - Implements traits defined in `cdf-connector-core`
//! - Contains all "impure" code (network, filesystem, environment)

pub mod config;
pub mod errors;
pub mod http;
pub mod observability;

// Re-export commonly used items
pub use errors::InfraError;
pub use http::{HttpClient, HttpClientBuilder, HttpTransport};
pub use observability::{init_tracing, try_init_tracing, LoggingConfig};
