//! Async utilities and patterns
//!
//! Timeouts and the two concurrency shapes used by the analysis pipeline:
//! chunked waves and an order-preserving bounded stream

use crate::error::{ErrorContext, GitPulseError, GitPulseResult};
use futures::future::join_all;
use futures::stream::{self, StreamExt};
use std::future::Future;
use tokio::time::{timeout, Duration};
use tracing::debug;

/// Timeout wrapper for async operations
pub async fn with_timeout<F, T>(
    future: F,
    duration: Duration,
    operation_name: &str,
) -> GitPulseResult<T>
where
    F: Future<Output = T>,
{
    match timeout(duration, future).await {
        Ok(result) => Ok(result),
        Err(_) => Err(GitPulseError::Timeout {
            operation: operation_name.to_string(),
            duration_ms: duration.as_millis() as u64,
            context: ErrorContext::new("async_utils")
                .with_operation("timeout")
                .with_metadata("timeout_ms", &duration.as_millis().to_string())
                .with_suggestion("Increase git.command_timeout_secs")
                .with_suggestion("Check network connectivity to the remote"),
        }),
    }
}

/// Process items in consecutive chunks of `chunk_size`.
///
/// Everything inside a chunk runs concurrently; the next chunk starts only once
/// every future of the current one has settled. Output order matches input order.
pub async fn process_in_chunks<'a, T, R, F, Fut>(
    items: &'a [T],
    chunk_size: usize,
    processor: F,
) -> Vec<R>
where
    F: Fn(&'a T) -> Fut,
    Fut: Future<Output = R>,
{
    let chunk_size = chunk_size.max(1);
    let mut results = Vec::with_capacity(items.len());

    for (index, chunk) in items.chunks(chunk_size).enumerate() {
        debug!(chunk = index, size = chunk.len(), "Starting chunk");
        let settled = join_all(chunk.iter().map(&processor)).await;
        results.extend(settled);
    }

    results
}

/// Run at most `max_concurrent` futures at a time, yielding results in input order
pub async fn process_bounded<T, R, F, Fut>(
    items: Vec<T>,
    max_concurrent: usize,
    processor: F,
) -> Vec<R>
where
    F: Fn(T) -> Fut,
    Fut: Future<Output = R>,
{
    stream::iter(items)
        .map(processor)
        .buffered(max_concurrent.max(1))
        .collect()
        .await
}
