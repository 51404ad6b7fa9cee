// ── Live device updates ──
//
// Consumer-side views of the device store: whole snapshots, the results
// that arrived since the last look, or one device's results as a `Stream`.

use std::collections::HashMap;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::model::PollResult;

type Snapshot = Arc<Vec<Arc<PollResult>>>;

/// One consumer's subscription to the device store.
pub struct DeviceStream {
    seen: Snapshot,
    receiver: watch::Receiver<Snapshot>,
}

impl DeviceStream {
    pub(crate) fn new(receiver: watch::Receiver<Snapshot>) -> Self {
        let seen = receiver.borrow().clone();
        Self { seen, receiver }
    }

    /// Every device's result as of the last `changed()` / `next_results()`.
    pub fn current(&self) -> &Snapshot {
        &self.seen
    }

    /// Wait for the next store write and return the full snapshot.
    /// `None` once the store is gone.
    pub async fn changed(&mut self) -> Option<Snapshot> {
        self.receiver.changed().await.ok()?;
        let snap = self.receiver.borrow_and_update().clone();
        self.seen = snap.clone();
        Some(snap)
    }

    /// Wait until at least one device has a result this consumer has not
    /// seen, and return only those, ordered by device key. Several writes
    /// between calls are folded into one batch.
    pub async fn next_results(&mut self) -> Option<Vec<Arc<PollResult>>> {
        loop {
            let previous = Arc::clone(&self.seen);
            let snap = self.changed().await?;
            let fresh = newer_than(&previous, &snap);
            if !fresh.is_empty() {
                return Some(fresh);
            }
        }
    }

    /// Results for a single device key, each new result yielded once.
    /// Starts with the stored result, if there is one.
    pub fn device(self, key: impl Into<String>) -> DeviceUpdates {
        DeviceUpdates {
            key: key.into(),
            last: None,
            inner: WatchStream::new(self.receiver),
        }
    }
}

/// Entries in `next` that are not the same `Arc` as in `prev`.
fn newer_than(prev: &[Arc<PollResult>], next: &[Arc<PollResult>]) -> Vec<Arc<PollResult>> {
    let before: HashMap<&str, &Arc<PollResult>> = prev.iter().map(|r| (r.key(), r)).collect();
    next.iter()
        .filter(|r| before.get(r.key()).is_none_or(|old| !Arc::ptr_eq(*old, *r)))
        .cloned()
        .collect()
}

/// `Stream` of one device's poll results.
pub struct DeviceUpdates {
    key: String,
    last: Option<Arc<PollResult>>,
    inner: WatchStream<Snapshot>,
}

impl Stream for DeviceUpdates {
    type Item = Arc<PollResult>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            let Some(snap) = std::task::ready!(Pin::new(&mut self.inner).poll_next(cx)) else {
                return Poll::Ready(None);
            };
            let Some(entry) = snap.iter().find(|r| r.key() == self.key).cloned() else {
                continue;
            };
            if self.last.as_ref().is_some_and(|last| Arc::ptr_eq(last, &entry)) {
                continue;
            }
            self.last = Some(Arc::clone(&entry));
            return Poll::Ready(Some(entry));
        }
    }
}
