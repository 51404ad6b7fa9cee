// ── Device state store ──
//
// Lock-free concurrent storage of the latest poll result per device, with
// push-based change notification via `watch` channels.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::watch;

use crate::model::{DeviceStatus, MetricsBundle, PollResult};
use crate::stream::DeviceStream;

type Snapshot = Arc<Vec<Arc<PollResult>>>;

/// Latest `PollResult` per device key.
///
/// Written only by the poller; any number of readers. Entries are replaced
/// as whole `Arc`s so a reader sees either the old or the new result,
/// never a mix. Every write bumps a version counter and republishes the
/// full snapshot to subscribers.
pub struct DeviceStore {
    by_key: DashMap<String, Arc<PollResult>>,
    version: watch::Sender<u64>,
    snapshot: watch::Sender<Snapshot>,
}

impl DeviceStore {
    pub fn new() -> Self {
        let (version, _) = watch::channel(0u64);
        let (snapshot, _) = watch::channel(Arc::new(Vec::new()));
        Self {
            by_key: DashMap::new(),
            version,
            snapshot,
        }
    }

    /// Replace the entry for `result`'s device. Returns the stored `Arc`.
    pub(crate) fn upsert(&self, result: PollResult) -> Arc<PollResult> {
        let entry = Arc::new(result);
        self.by_key
            .insert(entry.key().to_owned(), Arc::clone(&entry));
        self.rebuild_snapshot();
        self.bump_version();
        entry
    }

    pub fn get(&self, key: &str) -> Option<Arc<PollResult>> {
        self.by_key.get(key).map(|r| Arc::clone(r.value()))
    }

    /// Point-in-time copy of every entry.
    pub fn all(&self) -> HashMap<String, Arc<PollResult>> {
        self.by_key
            .iter()
            .map(|r| (r.key().clone(), Arc::clone(r.value())))
            .collect()
    }

    pub fn status(&self, key: &str) -> Option<DeviceStatus> {
        self.by_key.get(key).map(|r| r.status)
    }

    pub fn last_update(&self, key: &str) -> Option<DateTime<Utc>> {
        self.by_key.get(key).map(|r| r.polled_at)
    }

    pub fn metrics(&self, key: &str) -> Option<MetricsBundle> {
        self.by_key.get(key).and_then(|r| r.metrics.clone())
    }

    /// Current snapshot, ordered by device key (cheap `Arc` clone).
    pub fn snapshot(&self) -> Snapshot {
        self.snapshot.borrow().clone()
    }

    pub fn subscribe(&self) -> DeviceStream {
        DeviceStream::new(self.snapshot.subscribe())
    }

    /// Number of writes since creation.
    pub fn version(&self) -> u64 {
        *self.version.borrow()
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }

    // ── Private helpers ──────────────────────────────────────────────

    fn rebuild_snapshot(&self) {
        let mut values: Vec<Arc<PollResult>> =
            self.by_key.iter().map(|r| Arc::clone(r.value())).collect();
        values.sort_by(|a, b| a.key().cmp(b.key()));
        // `send_modify` updates unconditionally, even with zero receivers.
        self.snapshot.send_modify(|snap| *snap = Arc::new(values));
    }

    fn bump_version(&self) {
        self.version.send_modify(|v| *v += 1);
    }
}

impl Default for DeviceStore {
    fn default() -> Self {
        Self::new()
    }
}
