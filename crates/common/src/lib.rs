//! Shared utilities for the CDF connector crates.
//!
//! # Feature Tiers
//!
//! Enable cargo features to opt into the tiers you need:
//! - `foundation`: duration-string parsing
//! - `runtime`: clock abstractions used for cache expiry

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

// Foundation + runtime tiers
// -----------------------------------------------------------------
#[cfg(feature = "foundation")]
pub mod time;

// Re-export commonly used types and traits for convenience
// ------------------------
#[cfg(feature = "foundation")]
pub use time::{parse_duration, DurationParseError};
#[cfg(feature = "runtime")]
pub use time::{Clock, MockClock, SystemClock};
