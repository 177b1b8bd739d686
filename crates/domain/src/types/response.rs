//! Response envelope returned by the transport

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::constants::{ERROR_FIELD, ITEMS_FIELD, NEXT_CURSOR_FIELD};
use crate::errors::Result;

/// Full response object: `data` plus any top-level metadata.
///
/// Only `data.items`, `data.nextCursor` and `error` are interpreted; every
/// other field round-trips untouched through `extra` or `data`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    /// HTTP status of the exchange
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    /// Decoded response body
    #[serde(default)]
    pub data: Value,
    /// Top-level metadata next to `data`
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ResponseEnvelope {
    /// Envelope around `data` with no status or metadata.
    #[must_use]
    pub fn new(data: Value) -> Self {
        Self { status: None, data, extra: Map::new() }
    }

    /// Set the HTTP status.
    #[must_use]
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Add a top-level metadata field.
    #[must_use]
    pub fn with_extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// `data.items`, or an empty slice when absent.
    #[must_use]
    pub fn items(&self) -> &[Value] {
        self.data.get(ITEMS_FIELD).and_then(Value::as_array).map_or(&[], Vec::as_slice)
    }

    /// Remove and return `data.items`, leaving the rest of `data` in place.
    pub fn take_items(&mut self) -> Vec<Value> {
        match self.data.as_object_mut().and_then(|data| data.remove(ITEMS_FIELD)) {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        }
    }

    /// Deserialize `data.items` into `T`.
    ///
    /// # Errors
    ///
    /// `ConnectorError::Serialization` when an item does not match `T`.
    pub fn into_items<T: DeserializeOwned>(mut self) -> Result<Vec<T>> {
        let items = self.take_items();
        Ok(serde_json::from_value(Value::Array(items))?)
    }

    /// Continuation token for the next page, if the server sent one.
    #[must_use]
    pub fn next_cursor(&self) -> Option<&str> {
        self.data.get(NEXT_CURSOR_FIELD).and_then(Value::as_str)
    }

    /// Application-level error carried by an otherwise successful response,
    /// either at the top level or inside `data`.
    #[must_use]
    pub fn error(&self) -> Option<&Value> {
        self.extra
            .get(ERROR_FIELD)
            .or_else(|| self.data.get(ERROR_FIELD))
            .filter(|error| !error.is_null())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_deserialize_keeps_extra_metadata() {
        let envelope: ResponseEnvelope = serde_json::from_value(json!({
            "status": 200,
            "data": { "items": [1, 2], "nextCursor": "c1" },
            "meta": 1
        }))
        .unwrap();

        assert_eq!(envelope.status, Some(200));
        assert_eq!(envelope.items(), &[json!(1), json!(2)]);
        assert_eq!(envelope.next_cursor(), Some("c1"));
        assert_eq!(envelope.extra.get("meta"), Some(&json!(1)));

        let back = serde_json::to_value(&envelope).unwrap();
        assert_eq!(back["meta"], json!(1));
    }

    #[test]
    fn test_items_default_to_empty() {
        let envelope = ResponseEnvelope::new(json!({}));
        assert!(envelope.items().is_empty());
        assert_eq!(envelope.next_cursor(), None);

        let envelope = ResponseEnvelope::default();
        assert!(envelope.items().is_empty());
    }

    #[test]
    fn test_take_items_preserves_siblings() {
        let mut envelope = ResponseEnvelope::new(json!({ "items": [1], "meta": 2 }));
        assert_eq!(envelope.take_items(), vec![json!(1)]);
        assert_eq!(envelope.data, json!({ "meta": 2 }));
    }

    #[test]
    fn test_into_items_typed() {
        #[derive(Debug, PartialEq, Deserialize)]
        struct Event {
            id: u64,
        }
        let envelope = ResponseEnvelope::new(json!({ "items": [{ "id": 1 }, { "id": 2 }] }));
        let events: Vec<Event> = envelope.into_items().unwrap();
        assert_eq!(events, vec![Event { id: 1 }, Event { id: 2 }]);
    }

    #[test]
    fn test_error_detection() {
        let top_level: ResponseEnvelope =
            serde_json::from_value(json!({ "error": { "message": 1 } })).unwrap();
        assert_eq!(top_level.error(), Some(&json!({ "message": 1 })));

        let nested = ResponseEnvelope::new(json!({ "error": { "code": 400 } }));
        assert!(nested.error().is_some());

        let clean = ResponseEnvelope::new(json!({ "items": [] }));
        assert!(clean.error().is_none());

        let null_error = ResponseEnvelope::default().with_extra("error", Value::Null);
        assert!(null_error.error().is_none());
    }
}
