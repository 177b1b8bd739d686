//! Connector facade
//!
//! One [`Connector`] per configured datasource. It resolves logical paths to
//! proxy URLs and exposes the request strategies the query layer builds on:
//! plain requests, chunked batches, auto-pagination and cached requests.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use cdf_connector_common::time::{parse_duration, Clock, SystemClock};
use cdf_connector_domain::{
    AuthMode, ConnectorConfig, ConnectorError, RequestDescriptor, ResponseEnvelope, Result,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{info, instrument};

use crate::cache::ResponseCache;
use crate::chunking;
use crate::dispatch::{Dispatcher, Responses};
use crate::pagination;
use crate::routing::RouteResolver;
use crate::transport_ports::{dispatch, Transport};

/// Request orchestration for one datasource.
pub struct Connector<C: Clock = SystemClock> {
    routes: RouteResolver,
    transport: Arc<dyn Transport>,
    cache: ResponseCache<C>,
    dispatcher: Dispatcher,
    default_ttl: Duration,
    items_limit: usize,
}

impl Connector<SystemClock> {
    /// Build a connector on the system clock.
    ///
    /// # Errors
    ///
    /// [`ConnectorError::Config`] when `cache_ttl` does not parse or
    /// `items_limit` is zero.
    pub fn new(config: &ConnectorConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        Self::with_clock(config, transport, SystemClock)
    }
}

impl<C: Clock> Connector<C> {
    /// Build a connector whose cache reads time from `clock`.
    ///
    /// # Errors
    ///
    /// See [`Connector::new`].
    pub fn with_clock(
        config: &ConnectorConfig,
        transport: Arc<dyn Transport>,
        clock: C,
    ) -> Result<Self> {
        let default_ttl = parse_ttl(&config.cache_ttl)
            .map_err(|e| ConnectorError::Config(format!("cache_ttl: {e}")))?;
        if config.items_limit == 0 {
            return Err(ConnectorError::Config("items_limit must be positive".to_string()));
        }

        let routes = RouteResolver::from_config(config);
        info!(
            project = %config.project,
            auth_mode = ?routes.auth_mode(),
            cache_ttl = %config.cache_ttl,
            items_limit = config.items_limit,
            max_in_flight = ?config.max_in_flight,
            "connector created"
        );

        Ok(Self {
            routes,
            transport,
            cache: ResponseCache::with_clock(clock),
            dispatcher: Dispatcher::from_limit(config.max_in_flight),
            default_ttl,
            items_limit: config.items_limit,
        })
    }

    /// `true` in either OAuth mode.
    #[must_use]
    pub fn is_using_oauth(&self) -> bool {
        self.routes.auth_mode().is_oauth()
    }

    /// Routing mode fixed at construction.
    #[must_use]
    pub fn auth_mode(&self) -> AuthMode {
        self.routes.auth_mode()
    }

    /// Configured CDF project.
    #[must_use]
    pub fn project(&self) -> &str {
        self.routes.project()
    }

    /// Response cache behind [`Connector::cached_request`].
    #[must_use]
    pub const fn cache(&self) -> &ResponseCache<C> {
        &self.cache
    }

    /// Fan-out strategy used for chunks and [`Connector::concurrent`].
    #[must_use]
    pub const fn dispatcher(&self) -> Dispatcher {
        self.dispatcher
    }

    /// Resolve the route and send the request once.
    ///
    /// # Errors
    ///
    /// Transport failures, `NotFound` on an empty body, `Application` when
    /// the envelope carries an `error` field.
    #[instrument(skip(self, request), fields(path = %request.path, method = %request.method))]
    pub async fn request(&self, request: RequestDescriptor) -> Result<ResponseEnvelope> {
        let wire = self.routes.wire(request);
        dispatch(self.transport.as_ref(), wire).await
    }

    /// Send the request and deserialize `data.items`. An empty body yields an
    /// empty list.
    ///
    /// # Errors
    ///
    /// Same as [`Connector::request`], plus `Serialization` when the items do
    /// not match `T`.
    #[instrument(skip(self, request), fields(path = %request.path))]
    pub async fn fetch_items<T: DeserializeOwned>(
        &self,
        request: RequestDescriptor,
    ) -> Result<Vec<T>> {
        match self.request(request).await {
            Ok(envelope) => envelope.into_items(),
            Err(ConnectorError::NotFound(_)) => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }

    /// Send a batch request, chunked by the configured items limit.
    ///
    /// # Errors
    ///
    /// The first failing chunk's error.
    pub async fn chunk_and_fetch(&self, request: RequestDescriptor) -> Result<ResponseEnvelope> {
        self.chunk_and_fetch_with_limit(request, self.items_limit).await
    }

    /// Send a batch request in chunks of at most `items_limit` items.
    ///
    /// # Errors
    ///
    /// `InvalidRequest` for a zero limit, otherwise the first failing
    /// chunk's error.
    #[instrument(skip(self, request), fields(path = %request.path))]
    pub async fn chunk_and_fetch_with_limit(
        &self,
        request: RequestDescriptor,
        items_limit: usize,
    ) -> Result<ResponseEnvelope> {
        let wire = self.routes.wire(request);
        chunking::chunk_and_fetch(self.transport.as_ref(), &self.dispatcher, wire, items_limit)
            .await
    }

    /// Follow `nextCursor` until `data.limit` items (default 1000) are
    /// collected or the pages run out.
    ///
    /// # Errors
    ///
    /// The first failing page's error, or `Serialization` when the items do
    /// not match `T`.
    #[instrument(skip(self, request), fields(path = %request.path))]
    pub async fn fetch_and_paginate<T: DeserializeOwned>(
        &self,
        request: RequestDescriptor,
    ) -> Result<Vec<T>> {
        let wire = self.routes.wire(request);
        let items = pagination::fetch_and_paginate(self.transport.as_ref(), wire).await?;
        Ok(serde_json::from_value(Value::Array(items))?)
    }

    /// Send through the response cache, using the request's `cache_time` or
    /// the configured lifetime.
    ///
    /// # Errors
    ///
    /// The dispatch error, shared with every caller that joined it.
    pub async fn cached_request(&self, request: RequestDescriptor) -> Result<ResponseEnvelope> {
        let ttl = request.cache_time.unwrap_or(self.default_ttl);
        self.cached_request_for(request, ttl).await
    }

    /// [`Connector::cached_request`] with an explicit lifetime such as
    /// `"1s"` or `"5m"`.
    ///
    /// # Errors
    ///
    /// `InvalidRequest` when `ttl` does not parse, otherwise as
    /// [`Connector::cached_request`].
    pub async fn cached_request_with_ttl(
        &self,
        request: RequestDescriptor,
        ttl: &str,
    ) -> Result<ResponseEnvelope> {
        let ttl = parse_ttl(ttl).map_err(ConnectorError::InvalidRequest)?;
        self.cached_request_for(request, ttl).await
    }

    /// Run `op` over every input through the configured dispatcher.
    pub async fn concurrent<I, M, S, F, Op, Fut>(
        &self,
        inputs: Vec<(I, M)>,
        op: Op,
    ) -> Responses<S, F, M>
    where
        I: Send,
        M: Send,
        S: Send,
        F: Send,
        Op: Fn(I) -> Fut + Sync,
        Fut: Future<Output = std::result::Result<S, F>> + Send,
    {
        self.dispatcher.dispatch_all(inputs, op).await
    }

    #[instrument(skip(self, request), fields(path = %request.path, ttl = ?ttl))]
    async fn cached_request_for(
        &self,
        request: RequestDescriptor,
        ttl: Duration,
    ) -> Result<ResponseEnvelope> {
        let wire = self.routes.wire(request);
        let key = wire.cache_key();
        let transport = Arc::clone(&self.transport);
        self.cache
            .get_or_dispatch(&key, ttl, move || async move { dispatch(transport.as_ref(), wire).await })
            .await
    }
}

fn parse_ttl(ttl: &str) -> std::result::Result<Duration, String> {
    parse_duration(ttl).map_err(|e| format!("invalid cache lifetime {ttl:?}: {e}"))
}
