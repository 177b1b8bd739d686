//! Chunking of oversized batch requests
//!
//! A request whose `data.items` exceeds the transport's per-request limit is
//! split into consecutive slices. The slices are sent concurrently and the
//! responses are merged back in slice order: the merged `data.items` is the
//! concatenation of every slice's items, and every other field (inside
//! `data` and at the top level) comes from the first slice's response.
//!
//! Sends are not reversible, so when one slice fails the whole call fails
//! with that slice's error and the sibling results are discarded.

use cdf_connector_domain::constants::ITEMS_FIELD;
use cdf_connector_domain::{ConnectorError, ResponseEnvelope, Result, WireRequest};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::dispatch::{DispatchResult, Dispatcher};
use crate::transport_ports::{dispatch, Transport};

/// Send `request`, splitting `data.items` into slices of at most
/// `items_limit` elements when needed.
///
/// # Errors
///
/// - [`ConnectorError::InvalidRequest`] when `items_limit` is zero
/// - the error of the first failing slice, in slice order
pub async fn chunk_and_fetch(
    transport: &dyn Transport,
    dispatcher: &Dispatcher,
    request: WireRequest,
    items_limit: usize,
) -> Result<ResponseEnvelope> {
    if items_limit == 0 {
        return Err(ConnectorError::InvalidRequest("items limit must be positive".to_string()));
    }

    let total = request.items().map_or(0, Vec::len);
    if total <= items_limit {
        return dispatch(transport, request).await;
    }

    let chunks: Vec<(WireRequest, usize)> = request
        .items()
        .map(|items| {
            items
                .chunks(items_limit)
                .enumerate()
                .map(|(idx, slice)| (request.with_items(slice.to_vec()), idx))
                .collect()
        })
        .unwrap_or_default();

    debug!(url = %request.url, total, chunks = chunks.len(), items_limit, "chunking request");

    let results = dispatcher.run(chunks, |chunk| dispatch(transport, chunk)).await;
    merge(results)
}

fn merge(
    results: Vec<DispatchResult<ResponseEnvelope, ConnectorError, usize>>,
) -> Result<ResponseEnvelope> {
    let mut merged: Option<ResponseEnvelope> = None;
    let mut items = Vec::new();

    for result in results {
        match result {
            DispatchResult::Ok { mut value, .. } => {
                items.extend(value.take_items());
                if merged.is_none() {
                    merged = Some(value);
                }
            }
            DispatchResult::Err { error, metadata } => {
                warn!(chunk = metadata, error = %error, "chunk failed, discarding batch");
                return Err(error);
            }
        }
    }

    let mut merged =
        merged.ok_or_else(|| ConnectorError::Internal("no chunk responses to merge".to_string()))?;

    if !merged.data.is_object() {
        merged.data = Value::Object(Map::new());
    }
    if let Some(data) = merged.data.as_object_mut() {
        data.insert(ITEMS_FIELD.to_string(), Value::Array(items));
    }
    Ok(merged)
}
