//! Connector constants
//!
//! Route segments and diagnostic paths are part of the wire contract with the
//! datasource proxy and must match exactly.

// Route segments
/// Versioned per-project API prefix used behind the API-key route
pub const API_V1: &str = "api/v1/projects";
/// Proxy route that injects a per-project API key
pub const API_KEY_ROUTE: &str = "cdf-api-key";
/// Proxy route that forwards the caller's OAuth token
pub const OAUTH_PASS_THRU_ROUTE: &str = "cdf-oauth";
/// Proxy route that performs a client-credentials grant
pub const OAUTH_CLIENT_CREDS_ROUTE: &str = "cdf-cc-oauth";

// Endpoints called by the datasource health check
/// API-key login status, appended directly to the project name
pub const LOGIN_STATUS_PATH: &str = "login/status";
/// OAuth token inspection
pub const TOKEN_INSPECT_PATH: &str = "api/v1/token/inspect";

// Envelope / payload field names the connector interprets
/// Batch payload / response list
pub const ITEMS_FIELD: &str = "items";
/// Continuation token in a page response
pub const NEXT_CURSOR_FIELD: &str = "nextCursor";
/// Continuation token in a page request
pub const CURSOR_FIELD: &str = "cursor";
/// Requested total item count
pub const LIMIT_FIELD: &str = "limit";
/// Application error marker in an otherwise successful response
pub const ERROR_FIELD: &str = "error";

// Defaults
/// Items per request before a batch is chunked
pub const DEFAULT_ITEMS_LIMIT: usize = 1000;
/// Items collected by auto-pagination when the request sets no `limit`
pub const DEFAULT_PAGE_LIMIT: u64 = 1000;
/// Lifetime of a cached response
pub const DEFAULT_CACHE_TTL: &str = "10s";
/// Per-request HTTP timeout
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
