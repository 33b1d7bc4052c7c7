// Channel-backed feed: a pump task reads the bollard stream into a bounded queue.

use futures_util::{Stream, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::Result;
use crate::gateway::Feed;

pub struct ChannelFeed<T> {
    rx: mpsc::Receiver<Result<T>>,
    pending: Option<T>,
    pump: JoinHandle<()>,
}

impl<T: Send + 'static> ChannelFeed<T> {
    /// Spawns `pump` with the sending half of a queue holding at most `capacity` items.
    /// The full queue blocks the pump, which stops reading from the runtime.
    pub(crate) fn spawn<F, Fut>(capacity: usize, pump: F) -> Self
    where
        F: FnOnce(mpsc::Sender<Result<T>>) -> Fut,
        Fut: std::future::Future<Output = ()> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let pump = tokio::spawn(pump(tx));
        Self {
            rx,
            pending: None,
            pump,
        }
    }

    /// Waits for the first item so that a failure to open surfaces to the caller of `open`.
    pub(crate) async fn primed(mut self) -> Result<Self> {
        match self.rx.recv().await {
            Some(Ok(item)) => self.pending = Some(item),
            Some(Err(e)) => return Err(e),
            None => {}
        }
        Ok(self)
    }
}

impl<T: Send> Feed<T> for ChannelFeed<T> {
    async fn next(&mut self) -> Result<Option<T>> {
        if let Some(item) = self.pending.take() {
            return Ok(Some(item));
        }
        match self.rx.recv().await {
            Some(Ok(item)) => Ok(Some(item)),
            Some(Err(e)) => Err(e),
            None => Ok(None),
        }
    }
}

impl<T> Drop for ChannelFeed<T> {
    fn drop(&mut self) {
        self.pump.abort();
    }
}

/// Drains `stream` into `tx`, mapping each item. Stops after the first error or when the
/// receiving side is gone.
pub(crate) async fn pump<S, I, T, F>(stream: S, tx: mpsc::Sender<Result<T>>, mut map: F)
where
    S: Stream<Item = std::result::Result<I, bollard::errors::Error>>,
    F: FnMut(I) -> T,
{
    let mut stream = std::pin::pin!(stream);
    while let Some(item) = stream.next().await {
        let failed = item.is_err();
        let msg = item.map(&mut map).map_err(Into::into);
        if tx.send(msg).await.is_err() || failed {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn primed_feed_yields_first_item_then_rest() {
        let feed = ChannelFeed::spawn(2, |tx| async move {
            for i in 0..3u32 {
                if tx.send(Ok(i)).await.is_err() {
                    return;
                }
            }
        });
        let mut feed = feed.primed().await.unwrap();
        assert_eq!(feed.next().await.unwrap(), Some(0));
        assert_eq!(feed.next().await.unwrap(), Some(1));
        assert_eq!(feed.next().await.unwrap(), Some(2));
        assert_eq!(feed.next().await.unwrap(), None);
    }

    #[tokio::test]
    async fn primed_feed_reports_open_failure() {
        let feed = ChannelFeed::<u32>::spawn(2, |tx| async move {
            let _ = tx.send(Err(Error::NotFound("abc".into()))).await;
        });
        assert!(matches!(feed.primed().await, Err(Error::NotFound(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn full_queue_blocks_the_pump_until_read() {
        let sent = Arc::new(AtomicUsize::new(0));
        let counter = sent.clone();
        let mut feed = ChannelFeed::spawn(2, move |tx| async move {
            for i in 0..100u32 {
                if tx.send(Ok(i)).await.is_err() {
                    return;
                }
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        let idle = sent.load(Ordering::SeqCst);
        assert!(idle <= 3, "pump kept reading while nobody consumed: {idle}");

        assert_eq!(feed.next().await.unwrap(), Some(0));
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(sent.load(Ordering::SeqCst), idle + 1);

        drop(feed);
        let after_drop = sent.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(sent.load(Ordering::SeqCst), after_drop);
    }

    #[tokio::test]
    async fn empty_feed_ends_cleanly() {
        let feed = ChannelFeed::<u32>::spawn(1, |_tx| async move {});
        let mut feed = feed.primed().await.unwrap();
        assert_eq!(feed.next().await.unwrap(), None);
    }
}
