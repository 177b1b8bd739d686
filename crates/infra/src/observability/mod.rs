//! Structured logging setup
//!
//! Installs a global `tracing-subscriber` fmt subscriber. The filter comes
//! from `RUST_LOG` when set, otherwise from [`LoggingConfig::default_level`].
//!
//! ```no_run
//! use cdf_connector_infra::observability::{init_tracing_with, LoggingConfig};
//!
//! init_tracing_with(&LoggingConfig::json());
//! ```

use tracing::Level;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Configuration for structured logging.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// JSON lines instead of human-readable text
    pub json_format: bool,
    /// Level used when `RUST_LOG` is not set
    pub default_level: Level,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { json_format: false, default_level: Level::INFO }
    }
}

impl LoggingConfig {
    /// JSON lines at `info`.
    #[must_use]
    pub fn json() -> Self {
        Self { json_format: true, ..Default::default() }
    }

    /// Human-readable text at `info`.
    #[must_use]
    pub fn text() -> Self {
        Self::default()
    }

    /// Level used when `RUST_LOG` is not set.
    #[must_use]
    pub const fn with_level(mut self, level: Level) -> Self {
        self.default_level = level;
        self
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.default_level.to_string()))
    }
}

/// Install the default text subscriber at `info`.
///
/// Calling this more than once is a no-op.
pub fn init_tracing() {
    init_tracing_with(&LoggingConfig::default());
}

/// Install a subscriber built from `config`. Calling this more than once is a
/// no-op.
pub fn init_tracing_with(config: &LoggingConfig) {
    if try_init_tracing(config).is_err() {
        tracing::debug!("global tracing subscriber already installed");
    }
}

/// Install a subscriber built from `config`, reporting whether a global
/// subscriber was already set.
///
/// # Errors
///
/// Fails when another global subscriber is installed.
pub fn try_init_tracing(
    config: &LoggingConfig,
) -> Result<(), tracing_subscriber::util::TryInitError> {
    let filter = config.filter();
    if config.json_format {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_current_span(true).with_target(true))
            .try_init()
    } else {
        tracing_subscriber::registry().with(filter).with(fmt::layer().with_target(true)).try_init()
    }
}
