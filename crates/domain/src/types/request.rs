//! Logical and wire-level request shapes

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::constants::{CURSOR_FIELD, ITEMS_FIELD, LIMIT_FIELD};

/// Largest float below which every integer is exactly representable (2^53).
const MAX_EXACT_FLOAT: f64 = 9_007_199_254_740_992.0;

/// HTTP verbs the CDF API is driven with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    /// `GET`
    #[default]
    Get,
    /// `POST`
    Post,
}

impl HttpMethod {
    /// Upper-case verb as sent on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A logical request, addressed by API path rather than full URL.
///
/// # Example
///
/// ```
/// use cdf_connector_domain::{HttpMethod, RequestDescriptor};
/// use serde_json::json;
///
/// let request = RequestDescriptor::post("/timeseries/data/list", json!({ "items": [] }))
///     .with_request_id("panel-1");
/// assert_eq!(request.method, HttpMethod::Post);
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestDescriptor {
    /// API path, joined onto the route for the connector's auth mode
    pub path: String,
    /// HTTP verb, `GET` when omitted
    #[serde(default)]
    pub method: HttpMethod,
    /// JSON body
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Query parameters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<BTreeMap<String, String>>,
    /// Correlation id forwarded to the proxy; not part of the cache key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    /// Overrides the connector's cache lifetime for `cached_request`.
    #[serde(skip)]
    pub cache_time: Option<Duration>,
}

impl RequestDescriptor {
    /// GET request without a body.
    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self { path: path.into(), ..Self::default() }
    }

    /// POST request carrying `data` as its JSON body.
    #[must_use]
    pub fn post(path: impl Into<String>, data: Value) -> Self {
        Self { path: path.into(), method: HttpMethod::Post, data: Some(data), ..Self::default() }
    }

    /// Replace the HTTP verb.
    #[must_use]
    pub fn with_method(mut self, method: HttpMethod) -> Self {
        self.method = method;
        self
    }

    /// Set the JSON body.
    #[must_use]
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Add one query parameter.
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.get_or_insert_with(BTreeMap::new).insert(key.into(), value.into());
        self
    }

    /// Set the correlation id.
    #[must_use]
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    /// Override the cache lifetime for this request.
    #[must_use]
    pub fn with_cache_time(mut self, cache_time: Duration) -> Self {
        self.cache_time = Some(cache_time);
        self
    }

    /// Attach the resolved URL, producing what the transport receives.
    #[must_use]
    pub fn into_wire(self, url: String) -> WireRequest {
        WireRequest {
            url,
            method: self.method,
            data: self.data,
            params: self.params,
            request_id: self.request_id,
        }
    }
}

/// A route-resolved request: the only unit that crosses the transport
/// boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireRequest {
    /// Fully resolved URL
    pub url: String,
    /// HTTP verb
    pub method: HttpMethod,
    /// JSON body
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Query parameters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<BTreeMap<String, String>>,
    /// Sent as the `x-request-id` header
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl WireRequest {
    /// Request without body, params or request id.
    #[must_use]
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self { url: url.into(), method, data: None, params: None, request_id: None }
    }

    /// Set the JSON body.
    #[must_use]
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// `data.items`, when the body is an object holding an array there.
    #[must_use]
    pub fn items(&self) -> Option<&Vec<Value>> {
        self.data.as_ref()?.get(ITEMS_FIELD)?.as_array()
    }

    /// Copy of this request with `data.items` replaced.
    #[must_use]
    pub fn with_items(&self, items: Vec<Value>) -> Self {
        self.with_data_field(ITEMS_FIELD, Value::Array(items))
    }

    /// Copy of this request with `data.cursor` set.
    #[must_use]
    pub fn with_cursor(&self, cursor: &str) -> Self {
        self.with_data_field(CURSOR_FIELD, Value::String(cursor.to_string()))
    }

    /// `data.limit` as an unsigned count.
    ///
    /// Integral floats such as `10000.0` are accepted. `None` when the field
    /// is missing, null, negative, fractional or not a number; callers then
    /// fall back to their default.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn limit(&self) -> Option<u64> {
        let limit = self.data.as_ref()?.get(LIMIT_FIELD)?;
        limit.as_u64().or_else(|| {
            limit
                .as_f64()
                .filter(|value| value.fract() == 0.0 && (0.0..=MAX_EXACT_FLOAT).contains(value))
                .map(|value| value as u64)
        })
    }

    /// Deterministic key over `(url, method, data, params)`.
    ///
    /// Object keys are emitted in sorted order at every depth, so two bodies
    /// that differ only in key order map to the same key. `request_id` is not
    /// part of the key.
    #[must_use]
    pub fn cache_key(&self) -> String {
        let mut key = String::new();
        key.push_str(self.method.as_str());
        key.push(' ');
        key.push_str(&self.url);
        key.push(' ');
        match &self.data {
            Some(data) => write_canonical(data, &mut key),
            None => key.push_str("null"),
        }
        if let Some(params) = &self.params {
            key.push(' ');
            for (name, value) in params {
                key.push_str(&Value::String(name.clone()).to_string());
                key.push('=');
                key.push_str(&Value::String(value.clone()).to_string());
                key.push('&');
            }
        }
        key
    }

    fn with_data_field(&self, field: &str, value: Value) -> Self {
        let mut data = match &self.data {
            Some(Value::Object(fields)) => fields.clone(),
            _ => Map::new(),
        };
        data.insert(field.to_string(), value);
        Self { data: Some(Value::Object(data)), ..self.clone() }
    }
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(fields) => {
            let mut entries: Vec<(&String, &Value)> = fields.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            out.push('{');
            for (idx, (name, field)) in entries.into_iter().enumerate() {
                if idx > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(name.clone()).to_string());
                out.push(':');
                write_canonical(field, out);
            }
            out.push('}');
        }
        Value::Array(values) => {
            out.push('[');
            for (idx, item) in values.iter().enumerate() {
                if idx > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}
