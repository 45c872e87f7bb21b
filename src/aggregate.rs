//! Concurrent fan-out across upstream service providers
//!
//! Dispatches one task per provider, enforces a per-task deadline, and merges
//! outcomes into a keyed map as they complete. Failures and timeouts are
//! converted into fallback payloads so a batch always returns a value for
//! every submitted key.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use futures::future::BoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

/// Errors that can occur while invoking an upstream provider
#[derive(Debug, Error)]
pub enum ProviderError {
    /// HTTP request failed (connect, transport, or body read)
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Upstream answered with a non-success status code
    #[error("upstream returned HTTP {0}")]
    Status(reqwest::StatusCode),

    /// Upstream body was not the JSON we expected
    #[error("failed to parse upstream response: {0}")]
    Parse(#[from] serde_json::Error),

    /// The provider did not complete within its deadline; synthesized by the
    /// aggregator, never by the provider itself
    #[error("no response within {0:?}")]
    DeadlineExceeded(Duration),

    /// The upstream call failed and the cached provider had no snapshot,
    /// fresh or stale, to serve instead
    #[error("upstream failed with no cached snapshot to fall back on")]
    CacheMiss(#[source] Box<ProviderError>),

    /// The spawned provider task stopped before producing a result
    #[error("provider task stopped before completing")]
    Aborted,
}

impl ProviderError {
    /// Short, user-safe description for fallback payloads.
    ///
    /// Transport errors can embed URLs and socket addresses; those stay in
    /// the logs. Payloads only ever carry this sanitized form.
    pub fn advisory(&self) -> String {
        match self {
            Self::Http(_) => "upstream unreachable".to_string(),
            Self::Status(code) => format!("upstream returned HTTP {}", code.as_u16()),
            Self::Parse(_) => "upstream sent an unreadable response".to_string(),
            Self::DeadlineExceeded(deadline) => format!("no response within {:?}", deadline),
            Self::CacheMiss(_) => {
                "service unavailable and nothing cached to fall back on".to_string()
            }
            Self::Aborted => "provider stopped unexpectedly".to_string(),
        }
    }
}

/// One unit of fan-out work: an upstream call bounded by a deadline, with a
/// fallback payload constructor for when the call fails or times out.
///
/// Tasks are built fresh for every batch and consumed by [`run`].
pub struct ProviderTask {
    key: String,
    deadline: Duration,
    invoke: BoxFuture<'static, Result<Value, ProviderError>>,
    fallback: Box<dyn Fn(&ProviderError) -> Value + Send>,
}

impl ProviderTask {
    /// Creates a task for one provider.
    ///
    /// # Arguments
    /// * `key` - Result-map key; must be unique within a batch
    /// * `deadline` - Upper bound on how long `invoke` may run
    /// * `invoke` - The upstream call
    /// * `fallback` - Builds the substitute payload on failure; must not fail
    pub fn new(
        key: impl Into<String>,
        deadline: Duration,
        invoke: impl std::future::Future<Output = Result<Value, ProviderError>> + Send + 'static,
        fallback: impl Fn(&ProviderError) -> Value + Send + 'static,
    ) -> Self {
        Self {
            key: key.into(),
            deadline,
            invoke: Box::pin(invoke),
            fallback: Box::new(fallback),
        }
    }

    /// The key this task's outcome will be stored under
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The task's deadline
    pub fn deadline(&self) -> Duration {
        self.deadline
    }
}

/// Runs a batch of provider tasks concurrently and returns the merged result
/// map.
///
/// Every submitted key is present in the output exactly once, holding either
/// the provider's payload or its fallback. Outcomes are merged in completion
/// order; total wall-clock time is bounded by the longest single deadline,
/// not the sum.
pub async fn run(tasks: Vec<ProviderTask>) -> HashMap<String, Value> {
    let mut results = HashMap::with_capacity(tasks.len());
    let mut pending: FuturesUnordered<_> = tasks.into_iter().map(execute).collect();

    while let Some((key, value)) = pending.next().await {
        results.insert(key, value);
    }

    results
}

/// Drives one task to an outcome: payload, fallback-on-error, or
/// fallback-on-timeout.
///
/// The upstream call runs on its own tokio task so a deadline overrun leaves
/// it detached in the background; dropping the join handle discards its late
/// result instead of merging it.
async fn execute(task: ProviderTask) -> (String, Value) {
    let ProviderTask {
        key,
        deadline,
        invoke,
        fallback,
    } = task;

    let started = Instant::now();
    let handle = tokio::spawn(invoke);

    let value = match tokio::time::timeout(deadline, handle).await {
        Ok(Ok(Ok(payload))) => {
            debug!(
                key = %key,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "provider completed"
            );
            payload
        }
        Ok(Ok(Err(err))) => {
            warn!(
                key = %key,
                elapsed_ms = started.elapsed().as_millis() as u64,
                error = %err,
                "provider failed, using fallback"
            );
            fallback(&err)
        }
        Ok(Err(_join_err)) => {
            let err = ProviderError::Aborted;
            warn!(key = %key, error = %err, "provider task aborted, using fallback");
            fallback(&err)
        }
        Err(_elapsed) => {
            let err = ProviderError::DeadlineExceeded(deadline);
            warn!(
                key = %key,
                deadline_ms = deadline.as_millis() as u64,
                "provider timed out, using fallback"
            );
            fallback(&err)
        }
    };

    (key, value)
}
