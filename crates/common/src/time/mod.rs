//! Time utilities and abstractions
//!
//! - **[`duration`]**: parsing of human duration strings such as `"10s"`
//! - **[`clock`]**: real and mock monotonic clocks (runtime tier)
//!
//! ## Usage
//!
//! ```rust
//! # #[cfg(feature = "runtime")]
//! # {
//! use std::time::Duration;
//!
//! use cdf_connector_common::time::{parse_duration, Clock, MockClock};
//!
//! assert_eq!(parse_duration("10s").unwrap(), Duration::from_secs(10));
//!
//! let clock = MockClock::new();
//! let start = clock.now();
//! clock.advance(Duration::from_secs(5));
//! assert_eq!(clock.now().duration_since(start), Duration::from_secs(5));
//! # }
//! ```

#[cfg(feature = "runtime")]
pub mod clock;
pub mod duration;

#[cfg(feature = "runtime")]
pub use clock::{Clock, MockClock, SystemClock};
pub use duration::{parse_duration, DurationParseError};
