//! End-to-end tests: `Connector` over `HttpTransport` against a mock proxy.

use std::sync::Arc;

use cdf_connector_core::{test_datasource, Connector, HealthStatus, Transport};
use cdf_connector_domain::{ConnectorConfig, ConnectorError, RequestDescriptor};
use cdf_connector_infra::HttpTransport;
use serde_json::{json, Value};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

fn connector(mut config: ConnectorConfig) -> Connector {
    config.use_system_proxy = false;
    let transport: Arc<dyn Transport> =
        Arc::new(HttpTransport::from_config(&config).expect("transport"));
    Connector::new(&config, transport).expect("connector")
}

#[tokio::test]
async fn test_chunked_post_is_merged() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/cdf-oauth/timeseries/byids"))
        .respond_with(|request: &Request| {
            let body: Value = serde_json::from_slice(&request.body).unwrap_or_default();
            let echoed: Vec<Value> = body["items"]
                .as_array()
                .cloned()
                .unwrap_or_default()
                .into_iter()
                .map(|item| json!({ "id": item["id"], "name": "ts" }))
                .collect();
            ResponseTemplate::new(200).set_body_json(json!({ "items": echoed }))
        })
        .expect(3)
        .mount(&server)
        .await;

    let mut config = ConnectorConfig::new("publicdata", server.uri()).with_oauth_pass_thru(true);
    config.items_limit = 2;
    let connector = connector(config);

    let ids: Vec<Value> = (1..=5).map(|id| json!({ "id": id })).collect();
    let response = connector
        .chunk_and_fetch(RequestDescriptor::post("timeseries/byids", json!({ "items": ids })))
        .await
        .expect("merged response");

    let merged: Vec<i64> =
        response.items().iter().filter_map(|item| item["id"].as_i64()).collect();
    assert_eq!(merged, vec![1, 2, 3, 4, 5]);
    assert_eq!(response.status, Some(200));
}

#[tokio::test]
async fn test_pagination_follows_cursor() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/cdf-api-key/api/v1/projects/publicdata/events/list"))
        .and(body_partial_json(json!({ "cursor": "page-2" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "items": [{ "id": 3 }] })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/cdf-api-key/api/v1/projects/publicdata/events/list"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "items": [{ "id": 1 }, { "id": 2 }], "nextCursor": "page-2" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let connector = connector(ConnectorConfig::new("publicdata", server.uri()));
    let events: Vec<Value> = connector
        .fetch_and_paginate(RequestDescriptor::post("/events/list", json!({ "limit": 10 })))
        .await
        .expect("events");

    assert_eq!(events, vec![json!({ "id": 1 }), json!({ "id": 2 }), json!({ "id": 3 })]);
}

#[tokio::test]
async fn test_cached_request_hits_server_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/cdf-oauth/assets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "items": [] })))
        .expect(1)
        .mount(&server)
        .await;

    let connector =
        connector(ConnectorConfig::new("publicdata", server.uri()).with_oauth_pass_thru(true));
    let request = RequestDescriptor::get("assets");

    let (a, b) = tokio::join!(
        connector.cached_request(request.clone()),
        connector.cached_request(request.clone())
    );
    let c = connector.cached_request(request).await;

    assert_eq!(a.expect("first"), b.expect("second"));
    assert!(c.is_ok());
}

#[tokio::test]
async fn test_application_error_in_ok_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "error": { "message": "denied" } })),
        )
        .mount(&server)
        .await;

    let connector =
        connector(ConnectorConfig::new("publicdata", server.uri()).with_oauth_pass_thru(true));
    let err = connector.request(RequestDescriptor::get("assets")).await.unwrap_err();

    assert!(matches!(err, ConnectorError::Application(_)));
    assert_eq!(err.to_string(), "Application error: denied");
}

#[tokio::test]
async fn test_fetch_items_on_empty_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let connector =
        connector(ConnectorConfig::new("publicdata", server.uri()).with_oauth_pass_thru(true));
    let items: Vec<Value> =
        connector.fetch_items(RequestDescriptor::get("assets/42")).await.expect("items");

    assert!(items.is_empty());
}

/// Validates the health check against both login endpoints.
///
/// Assertions:
/// - API-key mode reads `login/status`.
/// - OAuth mode reads `api/v1/token/inspect`.
#[tokio::test]
async fn test_datasource_health_check() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/cdf-api-key/api/v1/projects/publicdatalogin/status"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "data": { "project": "publicdata", "loggedIn": true } })),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/cdf-oauth/api/v1/token/inspect"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "projects": [{ "projectUrlName": "other" }] })),
        )
        .mount(&server)
        .await;

    let api_key = connector(ConnectorConfig::new("publicdata", server.uri()));
    assert_eq!(test_datasource(&api_key).await.status, HealthStatus::Success);

    let oauth =
        connector(ConnectorConfig::new("publicdata", server.uri()).with_oauth_pass_thru(true));
    let result = test_datasource(&oauth).await;
    assert_eq!(result.status, HealthStatus::Warning);
    assert_eq!(result.message, "Cannot access 'publicdata' project");
}

#[tokio::test]
async fn test_unreachable_proxy_reports_invalid_credentials() {
    let connector = connector(
        ConnectorConfig::new("publicdata", "http://127.0.0.1:9").with_oauth_pass_thru(true),
    );
    let result = test_datasource(&connector).await;

    assert_eq!(result.status, HealthStatus::Error);
}
