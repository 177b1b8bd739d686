//! # CDF Connector Core
//!
//! Request orchestration on top of a host-supplied transport - no HTTP code.
//!
//! This crate contains:
//! - The transport port the host implements
//! - Route resolution per authentication mode
//! - Concurrent fan-out with success/failure partitioning
//! - Chunking of oversized batch requests
//! - Cursor-based auto-pagination
//! - A time-boxed response cache that collapses duplicate in-flight requests
//! - The `Connector` facade and the datasource health check
//!
//! ## Architecture Principles
//! - Only depends on `cdf-connector-common` and `cdf-connector-domain`
//! - All I/O goes through [`Transport`]
//! - Each request is attempted exactly once

pub mod cache;
pub mod chunking;
pub mod connector;
pub mod dispatch;
pub mod health;
pub mod pagination;
pub mod routing;

// Infrastructure ports
pub mod transport_ports;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use cache::ResponseCache;
pub use connector::Connector;
pub use dispatch::{concurrent, DispatchResult, Dispatcher, Failed, Responses, Succeeded};
pub use health::{test_datasource, HealthCheckResult, HealthStatus};
pub use routing::{resolve_route, RouteResolver};
pub use transport_ports::Transport;
