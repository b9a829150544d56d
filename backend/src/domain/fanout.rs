//! Bounded concurrent map-then-collect helper.
//!
//! All aggregate operations share the same shape: fan an async operation
//! out over a unit list, join, then reduce the per-unit outcomes
//! sequentially. This helper owns the fan-out and the join barrier; the
//! caller owns the reduction and the partial-failure policy.

use std::future::Future;

use futures_util::{StreamExt, stream};

/// Apply `op` to every item with at most `limit` calls in flight.
///
/// Results are collected in input order, so callers relying on stable
/// ordering (rankings, tie-breaks) can reduce directly over the output.
/// The whole fan-out completes before this returns; individual outcomes
/// carry their own success or failure.
pub(crate) async fn map_concurrently<T, R, F, Fut>(items: Vec<T>, limit: usize, op: F) -> Vec<R>
where
    F: Fn(T) -> Fut,
    Fut: Future<Output = R>,
{
    stream::iter(items.into_iter().map(op))
        .buffered(limit.max(1))
        .collect()
        .await
}
