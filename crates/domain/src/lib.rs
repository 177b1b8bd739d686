//! # CDF Connector Domain
//!
//! Data types shared by every layer of the connector.
//!
//! This crate contains:
//! - Request and response shapes (`RequestDescriptor`, `WireRequest`,
//!   `ResponseEnvelope`)
//! - The authentication routing mode (`AuthMode`)
//! - Connector configuration
//! - The error taxonomy and `Result` alias
//! - Wire-contract constants (route segments, defaults)
//!
//! ## Architecture
//! - No dependencies on other connector crates
//! - Only external dependencies allowed
//! - Pure data structures, no I/O

pub mod config;
pub mod constants;
pub mod errors;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
