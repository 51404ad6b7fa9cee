// Integration tests for `Poller` against scripted agents.
#![allow(clippy::unwrap_used)]

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::future::BoxFuture;
use pretty_assertions::assert_eq;

use netpulse_api::snmp::Value;
use netpulse_api::snmp::oids::{self, column};
use netpulse_core::{
    CoreError, DeviceDescriptor, DeviceStatus, HistoryRow, Inventory, MetricsSink, NullSink,
    PollResult, Poller, PollerState, StaticInventory,
};

use common::{Behavior, FakeNetwork, device, healthy_mib, test_config};

// ── Helpers ─────────────────────────────────────────────────────────

fn poller(net: &Arc<FakeNetwork>, devices: Vec<DeviceDescriptor>) -> Poller {
    Poller::with_exchange(
        test_config(),
        Arc::clone(net) as Arc<dyn netpulse_core::Exchange>,
        Arc::new(StaticInventory::new(devices)),
        Arc::new(NullSink),
    )
}

/// Sink that records which devices it was handed.
#[derive(Default)]
struct RecordingSink {
    written: Mutex<Vec<String>>,
}

impl MetricsSink for RecordingSink {
    fn write<'a>(&'a self, result: &'a PollResult) -> BoxFuture<'a, Result<(), CoreError>> {
        self.written.lock().unwrap().push(result.device.id.clone());
        Box::pin(async { Ok(()) })
    }

    fn query_history<'a>(&'a self, _: &'a str, _: i64) -> BoxFuture<'a, Vec<HistoryRow>> {
        Box::pin(async { Vec::new() })
    }
}

/// Inventory that always fails.
#[derive(Default)]
struct BrokenInventory {
    calls: AtomicUsize,
}

impl Inventory for BrokenInventory {
    fn list_devices(&self) -> BoxFuture<'_, Result<Vec<DeviceDescriptor>, CoreError>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Box::pin(async {
            Err(CoreError::Inventory {
                message: "database unavailable".into(),
            })
        })
    }
}

/// Inventory that panics on its first call and lists `devices` after.
struct PanicOnceInventory {
    calls: AtomicUsize,
    devices: Vec<DeviceDescriptor>,
}

impl Inventory for PanicOnceInventory {
    fn list_devices(&self) -> BoxFuture<'_, Result<Vec<DeviceDescriptor>, CoreError>> {
        assert!(
            self.calls.fetch_add(1, Ordering::SeqCst) > 0,
            "inventory backend crashed"
        );
        let devices = self.devices.clone();
        Box::pin(async move { Ok(devices) })
    }
}

/// Sink whose writes always fail, by error or by panic.
struct BrokenSink {
    panics: bool,
    calls: AtomicUsize,
}

impl BrokenSink {
    fn new(panics: bool) -> Self {
        Self {
            panics,
            calls: AtomicUsize::new(0),
        }
    }
}

impl MetricsSink for BrokenSink {
    fn write<'a>(&'a self, _: &'a PollResult) -> BoxFuture<'a, Result<(), CoreError>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        assert!(!self.panics, "influx client bug");
        Box::pin(async {
            Err(CoreError::Sink {
                message: "connection refused".into(),
            })
        })
    }

    fn query_history<'a>(&'a self, _: &'a str, _: i64) -> BoxFuture<'a, Vec<HistoryRow>> {
        Box::pin(async { Vec::new() })
    }
}

// ── Single-cycle behaviour ──────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_poll_once_derives_metrics() {
    let net = FakeNetwork::new();
    net.add("10.0.0.1", healthy_mib("core-sw"), Behavior::Normal);
    let poller = poller(&net, vec![device("a", "10.0.0.1")]);

    assert_eq!(poller.poll_once().await.unwrap(), 1);

    let result = poller.get_all_devices().remove("a").unwrap();
    assert_eq!(result.status, DeviceStatus::Online);
    let metrics = result.metrics.clone().unwrap();
    assert!((metrics.cpu_usage - 20.0).abs() < f64::EPSILON);
    assert!((metrics.mem_usage - 50.0).abs() < f64::EPSILON);
    assert_eq!(metrics.uptime_secs, Some(86_400));
    // First observation of the counters.
    assert!(metrics.bandwidth_in.abs() < f64::EPSILON);
    assert!(metrics.bandwidth_out.abs() < f64::EPSILON);

    let system = result.system.clone().unwrap();
    assert_eq!(system.name.as_deref(), Some("core-sw"));
    assert_eq!(system.location.as_deref(), Some("Rack 4"));
    assert_eq!(system.vendor.as_deref(), Some("cisco"));

    assert!(poller.counters().get(&result.device.endpoint).is_some());
    assert_eq!(poller.device_status("a"), Some(DeviceStatus::Online));
    assert!(poller.get_last_update("a").is_some());
    assert!(poller.get_metrics("missing").is_none());
}

#[tokio::test(start_paused = true)]
async fn test_bandwidth_across_cycles_handles_wrap() {
    let net = FakeNetwork::new();
    let mut mib = healthy_mib("edge");
    mib.insert(column(oids::IF_IN_OCTETS, 1), Value::Counter32(u32::MAX - 9));
    mib.insert(column(oids::IF_OUT_OCTETS, 1), Value::Counter32(1_000));
    net.add("10.0.0.2", mib, Behavior::Normal);
    let poller = poller(&net, vec![device("e", "10.0.0.2")]);

    poller.poll_once().await.unwrap();
    assert!(poller.get_metrics("e").unwrap().bandwidth_in.abs() < f64::EPSILON);

    tokio::time::advance(Duration::from_secs(10)).await;
    // In wraps: (2^32 - 10) -> 12_499_990 is 12.5 MB in 10 s = 10 Mbps.
    net.set("10.0.0.2", column(oids::IF_IN_OCTETS, 1), Value::Counter32(12_499_990));
    net.set("10.0.0.2", column(oids::IF_OUT_OCTETS, 1), Value::Counter32(2_251_000));
    poller.poll_once().await.unwrap();

    let metrics = poller.get_metrics("e").unwrap();
    assert!((metrics.bandwidth_in - 10.0).abs() < 1e-9);
    assert!((metrics.bandwidth_out - 1.8).abs() < 1e-9);
}

#[tokio::test(start_paused = true)]
async fn test_partial_counters_keep_previous_snapshot() {
    let net = FakeNetwork::new();
    net.add("10.0.0.2", healthy_mib("edge"), Behavior::Normal);
    let poller = poller(&net, vec![device("e", "10.0.0.2")]);
    let endpoint = netpulse_core::Endpoint::new("10.0.0.2", 161);

    poller.poll_once().await.unwrap();

    // Out counter vanishes for one cycle.
    tokio::time::advance(Duration::from_secs(10)).await;
    net.set("10.0.0.2", column(oids::IF_IN_OCTETS, 1), Value::Counter32(5_000_000));
    net.set("10.0.0.2", column(oids::IF_OUT_OCTETS, 1), Value::NoSuchInstance);
    poller.poll_once().await.unwrap();

    let metrics = poller.get_metrics("e").unwrap();
    assert!(metrics.bandwidth_in.abs() < f64::EPSILON);
    assert!(metrics.bandwidth_out.abs() < f64::EPSILON);
    let kept = poller.counters().get(&endpoint).unwrap();
    assert_eq!((kept.in_octets, kept.out_octets), (0, 0));

    // Rates span both intervals: 25 MB and 2.5 MB over 20 s.
    tokio::time::advance(Duration::from_secs(10)).await;
    net.set("10.0.0.2", column(oids::IF_IN_OCTETS, 1), Value::Counter32(25_000_000));
    net.set("10.0.0.2", column(oids::IF_OUT_OCTETS, 1), Value::Counter32(2_500_000));
    poller.poll_once().await.unwrap();

    let metrics = poller.get_metrics("e").unwrap();
    assert!((metrics.bandwidth_in - 10.0).abs() < 1e-9);
    assert!((metrics.bandwidth_out - 1.0).abs() < 1e-9);
}

#[tokio::test(start_paused = true)]
async fn test_unreachable_device_is_offline_with_zero_metrics() {
    let net = FakeNetwork::new();
    let poller = poller(&net, vec![device("x", "10.9.9.9")]);

    poller.poll_once().await.unwrap();

    assert_eq!(poller.device_status("x"), Some(DeviceStatus::Offline));
    let metrics = poller.get_metrics("x").unwrap();
    assert!(metrics.cpu_usage.abs() < f64::EPSILON);
    assert!(metrics.mem_usage.abs() < f64::EPSILON);
    assert_eq!(metrics.uptime_secs, None);
}

#[tokio::test(start_paused = true)]
async fn test_slow_device_is_warning() {
    let net = FakeNetwork::new();
    net.add("10.0.0.3", healthy_mib("slow"), Behavior::Slow(Duration::from_secs(6)));
    let poller = poller(&net, vec![device("s", "10.0.0.3")]);

    poller.poll_once().await.unwrap();

    assert_eq!(poller.device_status("s"), Some(DeviceStatus::Warning));
    assert!(poller.get_metrics("s").unwrap().response_time_ms >= 6_000.0);
}

#[tokio::test(start_paused = true)]
async fn test_recent_reboot_is_warning() {
    let net = FakeNetwork::new();
    let mut mib = healthy_mib("fresh");
    mib.insert(oids::oid(oids::SYS_UPTIME), Value::TimeTicks(30_000)); // 5 minutes
    net.add("10.0.0.4", mib, Behavior::Normal);
    let poller = poller(&net, vec![device("r", "10.0.0.4")]);

    poller.poll_once().await.unwrap();

    assert_eq!(poller.device_status("r"), Some(DeviceStatus::Warning));
    assert_eq!(poller.get_metrics("r").unwrap().uptime_secs, Some(300));
}

#[tokio::test(start_paused = true)]
async fn test_error_results_are_not_sent_to_sink() {
    let net = FakeNetwork::new();
    net.add("10.0.0.1", healthy_mib("a"), Behavior::Normal);
    net.add("10.0.0.2", healthy_mib("b"), Behavior::Panic);
    let sink = Arc::new(RecordingSink::default());
    let poller = Poller::with_exchange(
        test_config(),
        net,
        Arc::new(StaticInventory::new(vec![
            device("a", "10.0.0.1"),
            device("b", "10.0.0.2"),
        ])),
        Arc::clone(&sink) as Arc<dyn MetricsSink>,
    );

    poller.poll_once().await.unwrap();

    assert_eq!(*sink.written.lock().unwrap(), vec!["a".to_owned()]);
    assert_eq!(poller.device_status("b"), Some(DeviceStatus::Error));
}

#[tokio::test(start_paused = true)]
async fn test_subscribers_see_cycle_results() {
    let net = FakeNetwork::new();
    net.add("10.0.0.1", healthy_mib("a"), Behavior::Normal);
    let poller = poller(&net, vec![device("a", "10.0.0.1")]);
    let mut stream = poller.subscribe();
    assert!(stream.current().is_empty());

    poller.poll_once().await.unwrap();

    let snapshot = stream.changed().await.unwrap();
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].device.id, "a");
}

// ── Background loop ─────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_panicking_device_does_not_affect_others() {
    let net = FakeNetwork::new();
    net.add("10.0.0.1", healthy_mib("a"), Behavior::Normal);
    net.add("10.0.0.2", healthy_mib("b"), Behavior::Panic);
    net.add("10.0.0.3", healthy_mib("c"), Behavior::Normal);
    let poller = poller(
        &net,
        vec![
            device("a", "10.0.0.1"),
            device("b", "10.0.0.2"),
            device("c", "10.0.0.3"),
        ],
    );

    poller.start().unwrap();
    assert_eq!(poller.state(), PollerState::Running);
    tokio::time::sleep(Duration::from_millis(3_500)).await;

    // Every cycle reached all three devices.
    for host in ["10.0.0.1", "10.0.0.2", "10.0.0.3"] {
        assert!(net.identity_queries(host) >= 3, "{host} was not polled every cycle");
    }
    assert_eq!(poller.device_status("a"), Some(DeviceStatus::Online));
    assert_eq!(poller.device_status("c"), Some(DeviceStatus::Online));

    let b = poller.get_all_devices().remove("b").unwrap();
    assert_eq!(b.status, DeviceStatus::Error);
    assert!(b.metrics.is_none());
    assert!(b.error.as_deref().unwrap().contains("agent exploded"));

    poller.stop().await;
    assert_eq!(poller.state(), PollerState::Stopped);
}

#[tokio::test(start_paused = true)]
async fn test_stop_interrupts_hung_exchanges() {
    let net = FakeNetwork::new();
    net.add("10.0.0.1", healthy_mib("stuck"), Behavior::Hang);
    let poller = poller(&net, vec![device("h", "10.0.0.1")]);

    poller.start().unwrap();
    tokio::time::sleep(Duration::from_secs(1)).await;

    let began = tokio::time::Instant::now();
    poller.stop().await;
    assert!(began.elapsed() < poller.config().shutdown_timeout);
    assert_eq!(poller.state(), PollerState::Stopped);
    // The hung cycle never finished, so nothing was stored.
    assert!(poller.get_all_devices().is_empty());

    // Restartable.
    poller.start().unwrap();
    assert_eq!(poller.state(), PollerState::Running);
    poller.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_start_twice_is_noop() {
    let net = FakeNetwork::new();
    net.add("10.0.0.1", healthy_mib("a"), Behavior::Normal);
    let poller = poller(&net, vec![device("a", "10.0.0.1")]);

    poller.start().unwrap();
    poller.start().unwrap();
    tokio::time::sleep(Duration::from_millis(500)).await;

    // One loop, one cycle so far.
    assert_eq!(net.identity_queries("10.0.0.1"), 1);
    poller.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_failed_cycle_backs_off() {
    let inventory = Arc::new(BrokenInventory::default());
    let poller = Poller::with_exchange(
        test_config(),
        FakeNetwork::new(),
        Arc::clone(&inventory) as Arc<dyn Inventory>,
        Arc::new(NullSink),
    );

    poller.start().unwrap();
    tokio::time::sleep(Duration::from_secs(11)).await;
    poller.stop().await;

    // Attempts at t=0, 5 and 10 s: the 5 s backoff, not the 1 s interval.
    assert_eq!(inventory.calls.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn test_panicking_inventory_backs_off_and_recovers() {
    let inventory = Arc::new(PanicOnceInventory {
        calls: AtomicUsize::new(0),
        devices: vec![device("a", "10.0.0.1")],
    });
    let net = FakeNetwork::new();
    net.add("10.0.0.1", healthy_mib("a"), Behavior::Normal);
    let poller = Poller::with_exchange(
        test_config(),
        net,
        Arc::clone(&inventory) as Arc<dyn Inventory>,
        Arc::new(NullSink),
    );

    poller.start().unwrap();
    tokio::time::sleep(Duration::from_secs(6)).await;

    // Panicked at t=0, retried after the 5 s backoff.
    assert_eq!(inventory.calls.load(Ordering::SeqCst), 2);
    assert_eq!(poller.device_status("a"), Some(DeviceStatus::Online));
    assert_eq!(poller.state(), PollerState::Running);
    poller.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_poll_once_waits_for_running_cycle() {
    let net = FakeNetwork::new();
    net.add("10.0.0.1", healthy_mib("a"), Behavior::Slow(Duration::from_secs(2)));
    let poller = poller(&net, vec![device("a", "10.0.0.1")]);

    poller.start().unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(poller.poll_once().await.unwrap(), 1);

    assert!(net.identity_queries("10.0.0.1") >= 2);
    assert_eq!(net.peak_identity_in_flight(), 1);
    poller.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_sink_failures_do_not_affect_polling() {
    for panics in [false, true] {
        let net = FakeNetwork::new();
        net.add("10.0.0.1", healthy_mib("a"), Behavior::Normal);
        net.add("10.0.0.2", healthy_mib("b"), Behavior::Normal);
        let sink = Arc::new(BrokenSink::new(panics));
        let poller = Poller::with_exchange(
            test_config(),
            net,
            Arc::new(StaticInventory::new(vec![
                device("a", "10.0.0.1"),
                device("b", "10.0.0.2"),
            ])),
            Arc::clone(&sink) as Arc<dyn MetricsSink>,
        );

        poller.start().unwrap();
        tokio::time::sleep(Duration::from_millis(1_500)).await;

        // Two cycles at t=0 and 1 s, every device written both times.
        assert_eq!(sink.calls.load(Ordering::SeqCst), 4, "panics={panics}");
        assert_eq!(poller.device_status("a"), Some(DeviceStatus::Online));
        assert_eq!(poller.device_status("b"), Some(DeviceStatus::Online));
        assert_eq!(poller.state(), PollerState::Running);
        poller.stop().await;
    }
}

#[test]
fn test_start_requires_runtime() {
    let net = FakeNetwork::new();
    let poller = poller(&net, Vec::new());
    assert!(matches!(poller.start(), Err(CoreError::NoRuntime)));
    assert_eq!(poller.state(), PollerState::Stopped);
}
