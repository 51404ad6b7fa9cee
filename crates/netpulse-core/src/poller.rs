// ── Poller ──
//
// Lifecycle of the background polling task: start/stop, the cycle loop,
// device fan-out with per-device failure isolation, and read access to the
// latest results.

use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use futures_util::FutureExt;
use futures_util::future::join_all;
use strum::Display;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use netpulse_api::snmp::SnmpClient;

use crate::config::PollerConfig;
use crate::error::CoreError;
use crate::inventory::Inventory;
use crate::model::{DeviceDescriptor, DeviceStatus, MetricsBundle, PollResult};
use crate::poll::DevicePoller;
use crate::sink::{HistoryRow, MetricsSink};
use crate::store::{CounterStore, DeviceStore};
use crate::stream::DeviceStream;
use crate::transport::{Exchange, Transport};

// ── PollerState ──────────────────────────────────────────────────

/// Lifecycle state observable by consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum PollerState {
    Stopped,
    Running,
}

// ── Poller ───────────────────────────────────────────────────────

/// The polling engine.
///
/// Cheaply cloneable via `Arc<PollerInner>`. Owns the transport, the
/// stores, and its collaborators; nothing is global. Only the cycle task
/// (or a `poll_once` caller) writes to the stores.
#[derive(Clone)]
pub struct Poller {
    inner: Arc<PollerInner>,
}

struct PollerInner {
    config: PollerConfig,
    inventory: Arc<dyn Inventory>,
    sink: Arc<dyn MetricsSink>,
    devices: DevicePoller,
    store: Arc<DeviceStore>,
    state: watch::Sender<PollerState>,
    task: Mutex<Option<RunningTask>>,
    /// Held for the whole of a cycle so the loop and `poll_once` never
    /// write the stores at the same time.
    cycle: tokio::sync::Mutex<()>,
}

struct RunningTask {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl Poller {
    /// Create a poller that talks SNMP over UDP. Does NOT start polling --
    /// call [`start()`](Self::start).
    pub fn new(
        config: PollerConfig,
        inventory: Arc<dyn Inventory>,
        sink: Arc<dyn MetricsSink>,
    ) -> Self {
        let client = Arc::new(SnmpClient::new(config.transport));
        Self::with_exchange(config, client, inventory, sink)
    }

    /// Create a poller over any [`Exchange`] implementation.
    pub fn with_exchange(
        config: PollerConfig,
        exchange: Arc<dyn Exchange>,
        inventory: Arc<dyn Inventory>,
        sink: Arc<dyn MetricsSink>,
    ) -> Self {
        let transport = Transport::new(exchange, &config.transport, config.walk_limit);
        let devices = DevicePoller::new(transport, Arc::new(CounterStore::new()), &config);
        let (state, _) = watch::channel(PollerState::Stopped);

        Self {
            inner: Arc::new(PollerInner {
                config,
                inventory,
                sink,
                devices,
                store: Arc::new(DeviceStore::new()),
                state,
                task: Mutex::new(None),
                cycle: tokio::sync::Mutex::new(()),
            }),
        }
    }

    pub fn config(&self) -> &PollerConfig {
        &self.inner.config
    }

    pub fn store(&self) -> &Arc<DeviceStore> {
        &self.inner.store
    }

    pub fn counters(&self) -> &Arc<CounterStore> {
        self.inner.devices.counters()
    }

    // ── Lifecycle ────────────────────────────────────────────────

    /// Spawn the cycle task. A no-op if already running.
    pub fn start(&self) -> Result<(), CoreError> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| CoreError::NoRuntime)?;
        let mut slot = self.inner.task.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.is_some() {
            info!("poller already running");
            return Ok(());
        }

        let cancel = CancellationToken::new();
        let handle = runtime.spawn(poll_loop(self.clone(), cancel.clone()));
        *slot = Some(RunningTask { cancel, handle });
        drop(slot);

        self.inner.state.send_replace(PollerState::Running);
        info!(
            interval_secs = self.inner.config.poll_interval.as_secs(),
            "poller started"
        );
        Ok(())
    }

    /// Stop the cycle task. In-flight device polls are dropped at their
    /// next await point. Waits at most `shutdown_timeout`, then aborts.
    pub async fn stop(&self) {
        let task = self
            .inner
            .task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(RunningTask { cancel, mut handle }) = task else {
            debug!("poller not running");
            return;
        };

        self.inner.state.send_replace(PollerState::Stopped);
        cancel.cancel();

        let limit = self.inner.config.shutdown_timeout;
        if tokio::time::timeout(limit, &mut handle).await.is_err() {
            warn!(timeout_secs = limit.as_secs(), "poller did not stop in time, aborting");
            handle.abort();
        }
        info!("poller stopped");
    }

    pub fn state(&self) -> PollerState {
        *self.inner.state.borrow()
    }

    pub fn watch_state(&self) -> watch::Receiver<PollerState> {
        self.inner.state.subscribe()
    }

    /// Run one full cycle in the caller's task. Returns how many devices
    /// were polled. Waits for a cycle already in progress on the
    /// background loop before starting.
    pub async fn poll_once(&self) -> Result<usize, CoreError> {
        self.run_cycle().await
    }

    // ── Read access ──────────────────────────────────────────────

    pub fn subscribe(&self) -> DeviceStream {
        self.inner.store.subscribe()
    }

    pub fn get_all_devices(&self) -> HashMap<String, Arc<PollResult>> {
        self.inner.store.all()
    }

    pub fn device_status(&self, key: &str) -> Option<DeviceStatus> {
        self.inner.store.status(key)
    }

    pub fn get_last_update(&self, key: &str) -> Option<DateTime<Utc>> {
        self.inner.store.last_update(key)
    }

    pub fn get_metrics(&self, key: &str) -> Option<MetricsBundle> {
        self.inner.store.metrics(key)
    }

    /// Read back stored history from the sink.
    pub async fn device_history(&self, device_ip: &str, hours: i64) -> Vec<HistoryRow> {
        self.inner.sink.query_history(device_ip, hours).await
    }

    // ── Cycle ────────────────────────────────────────────────────

    async fn run_cycle(&self) -> Result<usize, CoreError> {
        let _cycle = self.inner.cycle.lock().await;
        let devices = self.inner.inventory.list_devices().await?;
        join_all(devices.iter().map(|d| self.poll_and_record(d))).await;
        debug!(
            devices = devices.len(),
            version = self.inner.store.version(),
            "poll cycle complete"
        );
        Ok(devices.len())
    }

    async fn poll_and_record(&self, device: &DeviceDescriptor) {
        let outcome = AssertUnwindSafe(self.inner.devices.poll(device))
            .catch_unwind()
            .await;
        let result = outcome.unwrap_or_else(|payload| {
            let err = CoreError::Panicked {
                device: device.name.clone(),
                message: panic_message(payload.as_ref()),
            };
            error!(device = %device.name, error = %err, "device poll failed");
            PollResult::failed(device.clone(), err.to_string())
        });

        let stored = self.inner.store.upsert(result);
        if stored.status == DeviceStatus::Error {
            return;
        }

        let write = AssertUnwindSafe(async { self.inner.sink.write(&stored).await })
            .catch_unwind()
            .await;
        match write {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(device = %device.name, error = %e, "metrics sink write failed"),
            Err(payload) => warn!(
                device = %device.name,
                panic = %panic_message(payload.as_ref()),
                "metrics sink panicked"
            ),
        }
    }
}

async fn poll_loop(poller: Poller, cancel: CancellationToken) {
    let config = &poller.inner.config;
    loop {
        let outcome = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            outcome = AssertUnwindSafe(poller.run_cycle()).catch_unwind() => outcome,
        };
        let pause = match outcome {
            Ok(Ok(_)) => config.poll_interval,
            Ok(Err(e)) => {
                error!(error = %e, "poll cycle failed");
                config.error_backoff
            }
            Err(payload) => {
                error!(panic = %panic_message(payload.as_ref()), "poll cycle panicked");
                config.error_backoff
            }
        };
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            () = tokio::time::sleep(pause) => {}
        }
    }
    debug!("poll loop exited");
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_owned()
    }
}
