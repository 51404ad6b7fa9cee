// ── Counter snapshots ──
//
// Last octet-counter reading per endpoint, for bandwidth rates.

use dashmap::DashMap;

use crate::metrics::CounterSnapshot;
use crate::model::Endpoint;

/// Previous counter readings keyed by endpoint (`host:port`), not by
/// device id, so two descriptors for one agent share a history.
#[derive(Default)]
pub struct CounterStore {
    by_endpoint: DashMap<String, CounterSnapshot>,
}

impl CounterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `current` and hand back whatever it replaced.
    pub(crate) fn replace(&self, endpoint: &Endpoint, current: CounterSnapshot) -> Option<CounterSnapshot> {
        self.by_endpoint.insert(endpoint.to_string(), current)
    }

    pub fn get(&self, endpoint: &Endpoint) -> Option<CounterSnapshot> {
        self.by_endpoint.get(&endpoint.to_string()).map(|r| *r.value())
    }

    pub fn len(&self) -> usize {
        self.by_endpoint.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_endpoint.is_empty()
    }
}
