//! Concurrent dispatch with success/failure partitioning
//!
//! Every input is paired with caller metadata (typically the query target it
//! belongs to). Each operation runs to completion; a failure never cancels
//! its siblings, and each outcome keeps its metadata so the caller can report
//! per-target errors.
//!
//! # Example
//!
//! ```
//! use cdf_connector_core::concurrent;
//!
//! # tokio_test::block_on(async {
//! let inputs = vec![(1, "A"), (-1, "B"), (2, "C")];
//! let responses = concurrent(inputs, |n: i32| async move {
//!     if n > 0 { Ok(n * 10) } else { Err("negative") }
//! })
//! .await;
//!
//! assert_eq!(responses.succeeded.len(), 2);
//! assert_eq!(responses.failed[0].metadata, "B");
//! # });
//! ```

use std::future::Future;

use futures::future::join_all;
use futures::stream::{self, StreamExt};
use tracing::{debug, warn};

/// Outcome of one dispatched operation, tagged with its input's metadata.
#[derive(Debug, Clone, PartialEq)]
#[allow(missing_docs)]
pub enum DispatchResult<S, F, M> {
    Ok { value: S, metadata: M },
    Err { error: F, metadata: M },
}

impl<S, F, M> DispatchResult<S, F, M> {
    /// Metadata of the input this outcome belongs to.
    #[must_use]
    pub const fn metadata(&self) -> &M {
        match self {
            Self::Ok { metadata, .. } | Self::Err { metadata, .. } => metadata,
        }
    }

    /// `true` for a successful outcome.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        matches!(self, Self::Ok { .. })
    }
}

/// A successful operation and the metadata of its input.
#[derive(Debug, Clone, PartialEq)]
#[allow(missing_docs)]
pub struct Succeeded<S, M> {
    pub value: S,
    pub metadata: M,
}

/// A failed operation and the metadata of its input.
#[derive(Debug, Clone, PartialEq)]
#[allow(missing_docs)]
pub struct Failed<F, M> {
    pub error: F,
    pub metadata: M,
}

/// Partitioned outcomes; each side keeps input order.
#[derive(Debug, Clone, PartialEq)]
pub struct Responses<S, F, M> {
    /// Operations that resolved
    pub succeeded: Vec<Succeeded<S, M>>,
    /// Operations that failed
    pub failed: Vec<Failed<F, M>>,
}

impl<S, F, M> Responses<S, F, M> {
    /// Split tagged outcomes into successes and failures.
    pub fn from_results(results: impl IntoIterator<Item = DispatchResult<S, F, M>>) -> Self {
        let mut succeeded = Vec::new();
        let mut failed = Vec::new();
        for result in results {
            match result {
                DispatchResult::Ok { value, metadata } => {
                    succeeded.push(Succeeded { value, metadata });
                }
                DispatchResult::Err { error, metadata } => failed.push(Failed { error, metadata }),
            }
        }
        Self { succeeded, failed }
    }

    /// `true` when nothing failed.
    #[must_use]
    pub fn is_all_ok(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Fan-out executor with an optional bound on operations in flight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Dispatcher {
    max_in_flight: Option<usize>,
}

impl Dispatcher {
    /// Submit everything at once.
    #[must_use]
    pub const fn unbounded() -> Self {
        Self { max_in_flight: None }
    }

    /// Keep at most `limit` operations in flight (a limit of 0 is treated
    /// as 1).
    #[must_use]
    pub fn bounded(limit: usize) -> Self {
        Self { max_in_flight: Some(limit.max(1)) }
    }

    /// Bounded when `limit` is set, unbounded otherwise.
    #[must_use]
    pub fn from_limit(limit: Option<usize>) -> Self {
        limit.map_or_else(Self::unbounded, Self::bounded)
    }

    /// Bound on operations in flight, `None` when unbounded.
    #[must_use]
    pub const fn max_in_flight(&self) -> Option<usize> {
        self.max_in_flight
    }

    /// Run `op` over every input and return the tagged outcomes in input
    /// order, regardless of completion order.
    pub async fn run<I, M, S, F, Op, Fut>(
        &self,
        inputs: Vec<(I, M)>,
        op: Op,
    ) -> Vec<DispatchResult<S, F, M>>
    where
        I: Send,
        M: Send,
        S: Send,
        F: Send,
        Op: Fn(I) -> Fut + Sync,
        Fut: Future<Output = Result<S, F>> + Send,
    {
        let total = inputs.len();
        debug!(total, max_in_flight = ?self.max_in_flight, "dispatching operations");

        let tagged = inputs.into_iter().map(|(input, metadata)| {
            let operation = op(input);
            async move {
                match operation.await {
                    Ok(value) => DispatchResult::Ok { value, metadata },
                    Err(error) => DispatchResult::Err { error, metadata },
                }
            }
        });

        match self.max_in_flight {
            None => join_all(tagged).await,
            Some(limit) => stream::iter(tagged).buffered(limit).collect().await,
        }
    }

    /// Run `op` over every input and partition the outcomes.
    pub async fn dispatch_all<I, M, S, F, Op, Fut>(
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
        Fut: Future<Output = Result<S, F>> + Send,
    {
        let responses = Responses::from_results(self.run(inputs, op).await);
        if !responses.failed.is_empty() {
            warn!(
                succeeded = responses.succeeded.len(),
                failed = responses.failed.len(),
                "dispatch completed with failures"
            );
        }
        responses
    }
}

/// Unbounded [`Dispatcher::dispatch_all`].
pub async fn concurrent<I, M, S, F, Op, Fut>(inputs: Vec<(I, M)>, op: Op) -> Responses<S, F, M>
where
    I: Send,
    M: Send,
    S: Send,
    F: Send,
    Op: Fn(I) -> Fut + Sync,
    Fut: Future<Output = Result<S, F>> + Send,
{
    Dispatcher::unbounded().dispatch_all(inputs, op).await
}
