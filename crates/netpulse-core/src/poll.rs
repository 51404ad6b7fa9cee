// ── Device poll orchestration ──
//
// One device, one cycle: identity query (timed), CPU, memory, bandwidth,
// classification. Every step degrades to zero on its own; only a panic
// can stop a device from producing a result, and the poller catches that.

use std::sync::Arc;

use chrono::Utc;
use tokio::time::Instant;
use tracing::debug;

use netpulse_api::snmp::oids::{self, column, oid};
use netpulse_api::snmp::{Oid, Target};

use crate::config::{CpuSource, Credentials, MemorySource, PollerConfig};
use crate::metrics::{self, Bandwidth, CounterSnapshot};
use crate::model::{DeviceDescriptor, MetricsBundle, PollResult, SystemInfo};
use crate::store::CounterStore;
use crate::transport::Transport;
use crate::value::PlainValue;

const SYS_DESCR: &str = "sysDescr";
const SYS_UPTIME: &str = "sysUpTime";
const SYS_NAME: &str = "sysName";
const SYS_LOCATION: &str = "sysLocation";
const SYS_OBJECT_ID: &str = "sysObjectID";

/// Runs the per-device sampling sequence.
pub struct DevicePoller {
    transport: Transport,
    counters: Arc<CounterStore>,
    credentials: Credentials,
    cpu_source: CpuSource,
    memory_source: MemorySource,
}

impl DevicePoller {
    pub fn new(transport: Transport, counters: Arc<CounterStore>, config: &PollerConfig) -> Self {
        Self {
            transport,
            counters,
            credentials: config.credentials.clone(),
            cpu_source: config.cpu_source.clone(),
            memory_source: config.memory_source,
        }
    }

    pub fn counters(&self) -> &Arc<CounterStore> {
        &self.counters
    }

    fn target(&self, device: &DeviceDescriptor) -> Target {
        Target::new(
            device.endpoint.host.clone(),
            device.endpoint.port,
            self.credentials.community_for(&device.name).clone(),
        )
    }

    /// Poll one device. Network trouble shows up as `Offline` or zeroed
    /// metrics, never as an error.
    pub async fn poll(&self, device: &DeviceDescriptor) -> PollResult {
        let target = self.target(device);

        let started = Instant::now();
        let identity = self
            .transport
            .query(
                &target,
                &[
                    (SYS_DESCR, oid(oids::SYS_DESCR)),
                    (SYS_UPTIME, oid(oids::SYS_UPTIME)),
                    (SYS_NAME, oid(oids::SYS_NAME)),
                    (SYS_LOCATION, oid(oids::SYS_LOCATION)),
                    (SYS_OBJECT_ID, oid(oids::SYS_OBJECT_ID)),
                ],
            )
            .await;
        let response_time_ms = metrics::round_to(started.elapsed().as_secs_f64() * 1000.0, 2);

        let cpu_usage = self.sample_cpu(&target).await;
        let mem_usage = self.sample_memory(&target).await;
        let bandwidth = self.sample_bandwidth(&target, device).await;

        let text = |key: &str| {
            identity
                .get(key)
                .and_then(PlainValue::as_text)
                .map(str::to_owned)
        };
        let uptime_secs = identity
            .get(SYS_UPTIME)
            .and_then(PlainValue::as_integer)
            .and_then(|v| u64::try_from(v).ok());
        let vendor = identity
            .get(SYS_OBJECT_ID)
            .and_then(PlainValue::as_text)
            .and_then(|s| s.parse::<Oid>().ok())
            .and_then(|o| oids::vendor_for(&o))
            .map(str::to_owned);

        let status = metrics::classify(
            identity.contains_key(SYS_DESCR),
            response_time_ms,
            uptime_secs,
        );
        debug!(
            device = %device.name,
            endpoint = %device.endpoint,
            %status,
            response_time_ms,
            "polled device"
        );

        PollResult {
            device: device.clone(),
            status,
            metrics: Some(MetricsBundle {
                response_time_ms,
                cpu_usage,
                mem_usage,
                bandwidth_in: bandwidth.inbound,
                bandwidth_out: bandwidth.outbound,
                uptime_secs,
            }),
            system: Some(SystemInfo {
                description: text(SYS_DESCR),
                name: text(SYS_NAME),
                location: text(SYS_LOCATION),
                uptime_secs,
                vendor,
            }),
            polled_at: Utc::now(),
            error: None,
        }
    }

    async fn sample_cpu(&self, target: &Target) -> f64 {
        match &self.cpu_source {
            CpuSource::ProcessorWalk => {
                let rows = self
                    .transport
                    .walk(target, &oid(oids::HR_PROCESSOR_LOAD))
                    .await;
                metrics::cpu_average(rows.iter().map(|(_, v)| v))
            }
            CpuSource::Indices(indices) => {
                let requests: Vec<(u32, Oid)> = indices
                    .iter()
                    .map(|&i| (i, column(oids::HR_PROCESSOR_LOAD, i)))
                    .collect();
                let loads = self.transport.query(target, &requests).await;
                metrics::cpu_average(loads.values())
            }
        }
    }

    async fn sample_memory(&self, target: &Target) -> f64 {
        let index = match self.memory_source {
            MemorySource::FixedIndex(index) => index,
            MemorySource::StorageWalk => {
                let rows = self
                    .transport
                    .walk(target, &oid(oids::HR_STORAGE_DESCR))
                    .await;
                let found = rows.iter().find_map(|(row, descr)| {
                    descr
                        .as_text()
                        .filter(|d| metrics::is_ram_description(d))
                        .and(row.last())
                });
                let Some(index) = found else {
                    return 0.0;
                };
                index
            }
        };

        let storage = self
            .transport
            .query(
                target,
                &[
                    ("units", column(oids::HR_STORAGE_ALLOCATION_UNITS, index)),
                    ("size", column(oids::HR_STORAGE_SIZE, index)),
                    ("used", column(oids::HR_STORAGE_USED, index)),
                ],
            )
            .await;
        if storage.is_empty() {
            return 0.0;
        }
        let get = |key: &str| storage.get(key).and_then(PlainValue::as_integer).unwrap_or(0);
        metrics::memory_percent(get("units"), get("size"), get("used"))
    }

    async fn sample_bandwidth(&self, target: &Target, device: &DeviceDescriptor) -> Bandwidth {
        let width = device.counter_width;
        let index = device.interface_index;
        let counters = self
            .transport
            .query(
                target,
                &[
                    ("in", column(width.in_column(), index)),
                    ("out", column(width.out_column(), index)),
                ],
            )
            .await;
        // Both counters or no sample.
        let get = |key: &str| counters.get(key).and_then(PlainValue::as_integer);
        let (Some(in_octets), Some(out_octets)) = (get("in"), get("out")) else {
            if !counters.is_empty() {
                debug!(device = %device.name, "incomplete interface counters, skipping");
            }
            return Bandwidth::default();
        };
        let current = CounterSnapshot {
            taken_at: Instant::now(),
            in_octets,
            out_octets,
        };
        let previous = self.counters.replace(&device.endpoint, current);
        metrics::bandwidth(previous.as_ref(), &current, width)
    }
}
