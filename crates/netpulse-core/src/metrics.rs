// ── Metric derivation ──
//
// Pure functions from normalized protocol values to the numbers in a
// `MetricsBundle`, plus the status classifier.

use tokio::time::Instant;

use crate::model::{CounterWidth, DeviceStatus};
use crate::value::PlainValue;

/// Response times above this are classified `Warning`.
pub const SLOW_RESPONSE_MS: f64 = 5000.0;

/// Devices up for fewer minutes than this were recently rebooted.
pub const REBOOT_WINDOW_MINUTES: u64 = 10;

/// Storage descriptions that identify the RAM row of `hrStorageTable`.
pub const RAM_DESCRIPTIONS: &[&str] = &["physical memory", "ram", "real memory"];

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Mean of the numeric loads, rounded to 2 decimals; 0 when there are none.
#[allow(clippy::cast_precision_loss, clippy::as_conversions)]
pub fn cpu_average<'a>(loads: impl IntoIterator<Item = &'a PlainValue>) -> f64 {
    let (sum, count) = loads
        .into_iter()
        .filter_map(PlainValue::as_f64)
        .fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
    if count == 0 {
        return 0.0;
    }
    round_to(sum / count as f64, 2)
}

/// Whether an `hrStorageDescr` value names physical memory.
pub fn is_ram_description(description: &str) -> bool {
    let lower = description.to_lowercase();
    RAM_DESCRIPTIONS.iter().any(|term| lower.contains(term))
}

/// `used / size` as a percentage rounded to 2 decimals. Zero when the size
/// or allocation unit is zero.
#[allow(clippy::cast_precision_loss, clippy::as_conversions)]
pub fn memory_percent(allocation_units: i128, size: i128, used: i128) -> f64 {
    if size == 0 || allocation_units == 0 {
        return 0.0;
    }
    round_to(used as f64 / size as f64 * 100.0, 2)
}

// ── Bandwidth ────────────────────────────────────────────────────────

/// Octet counters as read at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterSnapshot {
    pub taken_at: Instant,
    pub in_octets: i128,
    pub out_octets: i128,
}

/// Throughput in Mbps.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Bandwidth {
    pub inbound: f64,
    pub outbound: f64,
}

/// Octets elapsed between two counter readings, correcting for a single
/// wrap of a `width`-bit counter.
pub fn counter_delta(previous: i128, current: i128, width: CounterWidth) -> i128 {
    let delta = current - previous;
    if delta < 0 { delta + width.modulus() } else { delta }
}

/// Rate between two snapshots. No prior snapshot or a non-positive
/// interval yields zero.
#[allow(clippy::cast_precision_loss, clippy::as_conversions)]
pub fn bandwidth(
    previous: Option<&CounterSnapshot>,
    current: &CounterSnapshot,
    width: CounterWidth,
) -> Bandwidth {
    let Some(previous) = previous else {
        return Bandwidth::default();
    };
    let elapsed = current
        .taken_at
        .saturating_duration_since(previous.taken_at)
        .as_secs_f64();
    if elapsed <= 0.0 {
        return Bandwidth::default();
    }

    let mbps = |delta: i128| round_to(delta as f64 / elapsed * 8.0 / 1_000_000.0, 3);
    Bandwidth {
        inbound: mbps(counter_delta(previous.in_octets, current.in_octets, width)),
        outbound: mbps(counter_delta(previous.out_octets, current.out_octets, width)),
    }
}

// ── Status ───────────────────────────────────────────────────────────

/// First match wins: no description is `Offline`, a slow answer or a
/// recent reboot is `Warning`, anything else `Online`. Never `Error`.
#[allow(clippy::cast_precision_loss, clippy::as_conversions)]
pub fn classify(has_description: bool, response_time_ms: f64, uptime_secs: Option<u64>) -> DeviceStatus {
    if !has_description {
        return DeviceStatus::Offline;
    }
    if response_time_ms > SLOW_RESPONSE_MS {
        return DeviceStatus::Warning;
    }
    if let Some(uptime) = uptime_secs {
        if (uptime as f64 / 60.0) < REBOOT_WINDOW_MINUTES as f64 {
            return DeviceStatus::Warning;
        }
    }
    DeviceStatus::Online
}
