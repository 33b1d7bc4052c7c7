// Single-container stream: one runtime feed forwarded to a caller-owned sink.

use std::future::Future;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::derive::derive;
use crate::error::{Error, Result};
use crate::gateway::{Feed, RuntimeGateway};
use crate::models::DerivedMetrics;

/// Consumer of a stream's output (e.g. a WebSocket). Owned by one session for its lifetime.
pub trait Sink<T>: Send {
    fn deliver(&mut self, item: T) -> impl Future<Output = Result<()>> + Send;
}

/// Reads `feed` until it ends, forwarding each item through `map` into `sink`.
///
/// Delivery is awaited before the next read, so a slow sink throttles the feed.
/// Returns Ok on clean end of stream, `Error::Cancelled` once `cancel` fires, otherwise
/// the feed or sink error unchanged.
pub async fn forward<T, U, F, S, M>(
    cancel: &CancellationToken,
    feed: &mut F,
    sink: &mut S,
    mut map: M,
) -> Result<()>
where
    F: Feed<T>,
    S: Sink<U>,
    M: FnMut(T) -> U,
{
    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(Error::Cancelled),
            next = feed.next() => next?,
        };
        let Some(item) = next else {
            return Ok(());
        };
        let out = map(item);
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(Error::Cancelled),
            delivered = sink.deliver(out) => delivered?,
        }
    }
}

/// Streams derived metrics for one container into `sink` until the feed ends, the sink
/// fails or `cancel` fires. The runtime feed is released on every exit path.
pub async fn stream_one<G, S>(
    gateway: &G,
    cancel: &CancellationToken,
    container_id: &str,
    sink: &mut S,
) -> Result<()>
where
    G: RuntimeGateway,
    S: Sink<DerivedMetrics>,
{
    if cancel.is_cancelled() {
        return Err(Error::Cancelled);
    }
    let mut feed = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(Error::Cancelled),
        opened = gateway.open_usage_feed(container_id) => opened?,
    };
    let result = forward(cancel, &mut feed, sink, |raw| derive(&raw)).await;
    drop(feed);
    match &result {
        Ok(()) => debug!(container_id, "stats stream ended"),
        Err(Error::Cancelled) => debug!(container_id, "stats stream cancelled"),
        Err(Error::Sink(e)) => {
            debug!(container_id, error = %e, "stats sink write failed (client gone?)")
        }
        Err(e) => warn!(container_id, error = %e, "stats stream error"),
    }
    result
}

/// One-shot derived sample; `Ok(None)` when the runtime returned no data.
pub async fn snapshot<G: RuntimeGateway>(
    gateway: &G,
    container_id: &str,
) -> Result<Option<DerivedMetrics>> {
    let raw = gateway.one_shot_usage_sample(container_id).await?;
    Ok(raw.as_ref().map(derive))
}
