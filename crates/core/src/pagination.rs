//! Cursor pagination
//!
//! Pages are requested one after another, each carrying the previous page's
//! `nextCursor` as `data.cursor`, until the server stops returning a
//! non-empty cursor or at least `data.limit` items have been collected. The last page is kept
//! whole, so the result may hold more than `limit` items.

use cdf_connector_domain::constants::DEFAULT_PAGE_LIMIT;
use cdf_connector_domain::{Result, WireRequest};
use serde_json::Value;
use tracing::debug;

use crate::transport_ports::{dispatch, Transport};

/// Collect `data.items` across pages.
///
/// # Errors
///
/// The first failing page aborts the walk; items gathered so far are
/// discarded.
pub async fn fetch_and_paginate(
    transport: &dyn Transport,
    request: WireRequest,
) -> Result<Vec<Value>> {
    let limit = request.limit().unwrap_or(DEFAULT_PAGE_LIMIT);
    let mut items: Vec<Value> = Vec::new();
    let mut current = request;
    let mut pages = 0usize;

    loop {
        let mut page = dispatch(transport, current.clone()).await?;
        pages += 1;
        let cursor = page.next_cursor().filter(|cursor| !cursor.is_empty()).map(str::to_owned);
        items.extend(page.take_items());
        let collected = u64::try_from(items.len()).unwrap_or(u64::MAX);

        match cursor {
            Some(cursor) if collected < limit => {
                current = current.with_cursor(&cursor);
            }
            _ => break,
        }
    }

    debug!(url = %current.url, pages, collected = items.len(), limit, "pagination finished");
    Ok(items)
}

#[cfg(test)]
mod tests {
    use cdf_connector_domain::{ConnectorError, HttpMethod, TransportError};
    use serde_json::json;

    use super::*;
    use crate::testing::MockTransport;

    fn page(size: usize, cursor: Option<&str>) -> Value {
        let items = vec![json!({}); size];
        match cursor {
            Some(cursor) => json!({ "data": { "items": items, "nextCursor": cursor } }),
            None => json!({ "data": { "items": items } }),
        }
    }

    fn request(data: Value) -> WireRequest {
        WireRequest::new(HttpMethod::Post, "protocol://cdf-api-key/api/v1/projects/test/ø")
            .with_data(data)
    }

    /// Validates the walk stops once the requested limit is reached.
    ///
    /// Assertions:
    /// - 10 pages of 1000 are fetched for a limit of 10000.
    /// - Every page after the first carries the previous cursor.
    #[tokio::test]
    async fn test_paginates_up_to_limit() {
        let transport = MockTransport::with_responder(|_| {
            let envelope: cdf_connector_domain::ResponseEnvelope =
                serde_json::from_value(page(1000, Some("next")))?;
            Ok(Some(envelope))
        });

        let items = fetch_and_paginate(&transport, request(json!({ "limit": 10000 })))
            .await
            .unwrap();

        assert_eq!(items.len(), 10000);
        assert_eq!(transport.calls(), 10);

        let sent = transport.requests();
        assert_eq!(sent[0].data, Some(json!({ "limit": 10000 })));
        assert_eq!(sent[1].data, Some(json!({ "limit": 10000, "cursor": "next" })));
    }

    #[tokio::test]
    async fn test_stops_when_cursor_missing() {
        let transport = MockTransport::new();
        transport.push_json(page(1000, Some("c1")));
        transport.push_json(page(1000, Some("c2")));
        transport.push_json(page(500, None));

        let items = fetch_and_paginate(&transport, request(json!({ "limit": 10000 })))
            .await
            .unwrap();

        assert_eq!(items.len(), 2500);
        assert_eq!(transport.calls(), 3);
        assert_eq!(transport.requests()[2].data, Some(json!({ "limit": 10000, "cursor": "c2" })));
    }

    #[tokio::test]
    async fn test_empty_cursor_ends_walk() {
        let transport = MockTransport::new();
        transport.push_json(page(2, Some("c1")));
        transport.push_json(page(2, Some("")));

        let items = fetch_and_paginate(&transport, request(json!({ "limit": 100 }))).await.unwrap();

        assert_eq!(items.len(), 4);
        assert_eq!(transport.calls(), 2);
    }

    #[tokio::test]
    async fn test_integral_float_limit_is_honoured() {
        let transport = MockTransport::with_responder(|_| {
            let envelope: cdf_connector_domain::ResponseEnvelope =
                serde_json::from_value(page(1000, Some("next")))?;
            Ok(Some(envelope))
        });

        let items = fetch_and_paginate(&transport, request(json!({ "limit": 3000.0 })))
            .await
            .unwrap();

        assert_eq!(items.len(), 3000);
        assert_eq!(transport.calls(), 3);
    }

    #[tokio::test]
    async fn test_default_limit_without_limit_field() {
        let transport = MockTransport::new();
        transport.push_json(page(1000, Some("c1")));

        let items = fetch_and_paginate(&transport, request(json!({}))).await.unwrap();

        assert_eq!(items.len(), 1000);
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn test_last_page_may_overshoot_limit() {
        let transport = MockTransport::new();
        transport.push_json(page(3, Some("c1")));
        transport.push_json(page(3, Some("c2")));

        let items = fetch_and_paginate(&transport, request(json!({ "limit": 5 }))).await.unwrap();

        assert_eq!(items.len(), 6);
        assert_eq!(transport.calls(), 2);
    }

    #[tokio::test]
    async fn test_page_failure_aborts() {
        let transport = MockTransport::new();
        transport.push_json(page(10, Some("c1")));
        transport.push_err(ConnectorError::Transport(TransportError::with_status(503, "down")));

        let result = fetch_and_paginate(&transport, request(json!({ "limit": 100 }))).await;

        assert_eq!(result.unwrap_err().status(), Some(503));
        assert_eq!(transport.calls(), 2);
    }
}
