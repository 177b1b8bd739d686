//! Configuration loader
//!
//! Loads connector configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If incomplete, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! Every loaded configuration is validated before it is returned.
//!
//! ## Environment Variables
//! - `CDF_PROJECT`: CDF project name (required)
//! - `CDF_BASE_URL`: Datasource proxy base URL (required)
//! - `CDF_OAUTH_PASS_THRU`: Forward the user's OAuth token (true/false)
//! - `CDF_OAUTH_CLIENT_CREDS`: Use OAuth client credentials (true/false)
//! - `CDF_CACHE_TTL`: Cached response lifetime, e.g. `10s`
//! - `CDF_ITEMS_LIMIT`: Items per request before chunking
//! - `CDF_MAX_IN_FLIGHT`: Bound on concurrently dispatched requests
//! - `CDF_HTTP_TIMEOUT_SECS`: HTTP request timeout in seconds
//! - `CDF_USE_SYSTEM_PROXY`: Honour `HTTP(S)_PROXY` (true/false, default true)
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./cdf-connector.json` or `./cdf-connector.toml` (current working
//!    directory)
//! 2. `./config.json` or `./config.toml` (current working directory)
//! 3. The same names in the parent and grandparent directories
//! 4. Relative to executable location

use std::path::{Path, PathBuf};
use std::str::FromStr;

use cdf_connector_common::time::parse_duration;
use cdf_connector_domain::{AuthMode, ConnectorConfig, ConnectorError, Result};
use url::Url;

const CONFIG_FILE_NAMES: [&str; 4] =
    ["cdf-connector.json", "cdf-connector.toml", "config.json", "config.toml"];

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If any required
/// variables are missing, falls back to loading from a config file.
///
/// # Errors
/// Returns `ConnectorError::Config` if:
/// - Configuration cannot be loaded from either source
/// - File format is invalid
/// - The loaded configuration fails validation
pub fn load() -> Result<ConnectorConfig> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// `CDF_PROJECT` and `CDF_BASE_URL` must be present; everything else falls
/// back to its default.
///
/// # Errors
/// Returns `ConnectorError::Config` if required variables are missing
/// or have invalid values.
pub fn load_from_env() -> Result<ConnectorConfig> {
    let mut config = ConnectorConfig::new(env_var("CDF_PROJECT")?, env_var("CDF_BASE_URL")?);

    config.oauth_pass_thru = env_bool("CDF_OAUTH_PASS_THRU", false);
    config.oauth_client_creds = env_bool("CDF_OAUTH_CLIENT_CREDS", false);
    if let Ok(ttl) = std::env::var("CDF_CACHE_TTL") {
        config.cache_ttl = ttl;
    }
    if let Some(limit) = env_parse("CDF_ITEMS_LIMIT")? {
        config.items_limit = limit;
    }
    config.max_in_flight = env_parse("CDF_MAX_IN_FLIGHT")?;
    if let Some(timeout) = env_parse("CDF_HTTP_TIMEOUT_SECS")? {
        config.http_timeout_secs = timeout;
    }
    config.use_system_proxy = env_bool("CDF_USE_SYSTEM_PROXY", true);

    validate(&config)?;
    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `ConnectorError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
/// - The loaded configuration fails validation
pub fn load_from_file(path: Option<PathBuf>) -> Result<ConnectorConfig> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(ConnectorError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            ConnectorError::Config(
                "No config file found in any of the standard locations".to_string(),
            )
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| ConnectorError::Config(format!("Failed to read config file: {e}")))?;

    let config = parse_config(&contents, &config_path)?;
    validate(&config)?;
    Ok(config)
}

/// Check a configuration for values the connector cannot work with.
///
/// # Errors
/// Returns `ConnectorError::Config` when:
/// - `project` is empty in API-key mode
/// - `base_url` is not an absolute URL
/// - `cache_ttl` is not a duration string
/// - `items_limit`, `max_in_flight` or `http_timeout_secs` is zero
pub fn validate(config: &ConnectorConfig) -> Result<()> {
    if config.auth_mode() == AuthMode::ApiKey && config.project.trim().is_empty() {
        return Err(ConnectorError::Config("project is required in API-key mode".to_string()));
    }

    Url::parse(&config.base_url).map_err(|e| {
        ConnectorError::Config(format!("Invalid base_url {:?}: {e}", config.base_url))
    })?;

    parse_duration(&config.cache_ttl).map_err(|e| {
        ConnectorError::Config(format!("Invalid cache_ttl {:?}: {e}", config.cache_ttl))
    })?;

    if config.items_limit == 0 {
        return Err(ConnectorError::Config("items_limit must be positive".to_string()));
    }
    if config.max_in_flight == Some(0) {
        return Err(ConnectorError::Config("max_in_flight must be positive".to_string()));
    }
    if config.http_timeout_secs == 0 {
        return Err(ConnectorError::Config("http_timeout_secs must be positive".to_string()));
    }

    Ok(())
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
///
/// # Errors
/// Returns `ConnectorError::Config` if format is invalid or parsing fails.
fn parse_config(contents: &str, path: &Path) -> Result<ConnectorConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| ConnectorError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| ConnectorError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(ConnectorError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// Probe multiple paths for configuration files
///
/// Searches the current working directory, its parent and grandparent, and
/// then the same locations relative to the executable.
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        candidates.extend(candidates_in(&cwd));
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            candidates.extend(candidates_in(exe_dir));
        }
    }

    candidates.into_iter().find(|path| path.exists())
}

fn candidates_in(dir: &Path) -> Vec<PathBuf> {
    ["", "..", "../.."]
        .iter()
        .flat_map(|up| CONFIG_FILE_NAMES.iter().map(move |name| dir.join(up).join(name)))
        .collect()
}

/// Get required environment variable
///
/// # Errors
/// Returns `ConnectorError::Config` if the variable is not set.
fn env_var(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| {
        ConnectorError::Config(format!("Missing required environment variable: {key}"))
    })
}

/// Parse an optional numeric environment variable
///
/// # Errors
/// Returns `ConnectorError::Config` if the variable is set but does not parse.
fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConnectorError::Config(format!("Invalid {key}: {e}"))),
        Err(_) => Ok(None),
    }
}

/// Parse boolean from environment variable
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}
