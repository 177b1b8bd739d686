//! Single-attempt HTTP client shared by the transport

use std::time::Duration;

use cdf_connector_domain::constants::DEFAULT_HTTP_TIMEOUT_SECS;
use cdf_connector_domain::ConnectorError;
use reqwest::{Client as ReqwestClient, Method, Proxy, RequestBuilder, Response};
use tracing::debug;

use crate::errors::InfraError;

/// HTTP client with a request timeout. Every request is attempted exactly
/// once; retry policy belongs to the caller.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: ReqwestClient,
}

impl HttpClient {
    /// Start building a new HTTP client.
    #[must_use]
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    /// Convenience constructor with default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error when the TLS backend cannot be initialised.
    pub fn new() -> Result<Self, ConnectorError> {
        Self::builder().build()
    }

    /// Create a request builder using the underlying reqwest client.
    pub fn request<U>(&self, method: Method, url: U) -> RequestBuilder
    where
        U: reqwest::IntoUrl,
    {
        self.client.request(method, url)
    }

    /// Execute the provided request builder once.
    ///
    /// # Errors
    ///
    /// `InvalidRequest` when the request cannot be built, `Transport` for
    /// connect failures and timeouts. Non-success statuses are returned as
    /// responses.
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response, ConnectorError> {
        let request = builder.build().map_err(|err| ConnectorError::from(InfraError::from(err)))?;

        let method = request.method().clone();
        let url = request.url().clone();
        debug!(%method, %url, "sending HTTP request");

        match self.client.execute(request).await {
            Ok(response) => {
                debug!(%method, %url, status = %response.status(), "received HTTP response");
                Ok(response)
            }
            Err(err) => {
                debug!(%method, %url, error = %err, "HTTP request failed");
                Err(InfraError::from(err).into())
            }
        }
    }
}

/// Builder for [`HttpClient`].
#[derive(Debug)]
pub struct HttpClientBuilder {
    timeout: Duration,
    user_agent: Option<String>,
    default_headers: Option<reqwest::header::HeaderMap>,
    system_proxy: bool,
    proxy: Option<Proxy>,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            user_agent: None,
            default_headers: None,
            system_proxy: true,
            proxy: None,
        }
    }
}

impl HttpClientBuilder {
    /// Total time allowed for one request.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// `User-Agent` sent with every request.
    #[must_use]
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Headers sent with every request.
    #[must_use]
    pub fn default_headers(mut self, headers: reqwest::header::HeaderMap) -> Self {
        self.default_headers = Some(headers);
        self
    }

    /// Whether to honour `HTTP_PROXY` / `HTTPS_PROXY` / `NO_PROXY`. On by
    /// default.
    #[must_use]
    pub fn system_proxy(mut self, enabled: bool) -> Self {
        self.system_proxy = enabled;
        self
    }

    /// Route every request through `proxy`, ignoring the environment.
    #[must_use]
    pub fn proxy(mut self, proxy: Proxy) -> Self {
        self.proxy = Some(proxy);
        self
    }

    /// Build the client.
    ///
    /// # Errors
    ///
    /// Returns an error when reqwest rejects the configuration.
    pub fn build(self) -> Result<HttpClient, ConnectorError> {
        let mut builder = ReqwestClient::builder().timeout(self.timeout);

        match self.proxy {
            Some(proxy) => builder = builder.proxy(proxy),
            None if !self.system_proxy => builder = builder.no_proxy(),
            None => {}
        }

        if let Some(agent) = self.user_agent {
            builder = builder.user_agent(agent);
        }

        if let Some(headers) = self.default_headers {
            builder = builder.default_headers(headers);
        }

        let client = builder.build().map_err(|err| ConnectorError::from(InfraError::from(err)))?;

        Ok(HttpClient { client })
    }
}

#[cfg(test)]
mod tests {
    use std::net::TcpListener;

    use reqwest::header::{HeaderMap, HeaderValue};
    use reqwest::{Method, StatusCode};
    use wiremock::matchers::{header, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn local_client() -> HttpClient {
        HttpClient::builder().system_proxy(false).build().expect("http client")
    }

    #[tokio::test]
    async fn server_errors_are_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        let client = local_client();
        let response =
            client.send(client.request(Method::GET, server.uri())).await.expect("response");

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
    }

    #[tokio::test]
    async fn sends_default_headers_and_user_agent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header("x-grafana-org-id", "1"))
            .and(header("user-agent", "cdf-connector-test"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let mut headers = HeaderMap::new();
        headers.insert("x-grafana-org-id", HeaderValue::from_static("1"));
        let client = HttpClient::builder()
            .system_proxy(false)
            .user_agent("cdf-connector-test")
            .default_headers(headers)
            .build()
            .expect("http client");

        let response =
            client.send(client.request(Method::GET, server.uri())).await.expect("response");
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn times_out_slow_responses() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
            .mount(&server)
            .await;

        let client = HttpClient::builder()
            .system_proxy(false)
            .timeout(Duration::from_millis(50))
            .build()
            .expect("http client");
        let result = client.send(client.request(Method::GET, server.uri())).await;

        match result {
            Err(ConnectorError::Transport(err)) => assert!(err.message.contains("timed out")),
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn network_failure_is_reported_once() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener); // release the port so that requests fail with ECONNREFUSED
        let url = format!("http://{addr}");

        let client = local_client();
        let result = client.send(client.request(Method::GET, &url)).await;

        assert!(matches!(result, Err(ConnectorError::Transport(_))));
    }

    /// Validates requests can be routed through an explicit proxy.
    ///
    /// Assertions:
    /// - A request for an unresolvable host reaches the proxy instead.
    #[tokio::test]
    async fn routes_through_configured_proxy() {
        let proxy = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&proxy)
            .await;

        let client = HttpClient::builder()
            .proxy(Proxy::http(proxy.uri()).expect("proxy url"))
            .build()
            .expect("http client");
        let response = client
            .send(client.request(Method::GET, "http://grafana.invalid/api/datasources/proxy/1"))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
    }
}
