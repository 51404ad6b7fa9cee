// ── Time-series sink ──
//
// Best-effort export of poll results and read-back of history. The poller
// logs and drops write errors; history reads degrade to an empty list.

use chrono::{DateTime, Utc};
use futures_util::future::BoxFuture;
use serde::Serialize;
use tracing::{debug, error, warn};

use netpulse_api::influx::{InfluxClient, Point, Row};

use crate::error::CoreError;
use crate::model::PollResult;

pub const MEASUREMENT: &str = "device_metrics";

/// History window bounds, in hours.
pub const MIN_HISTORY_HOURS: i64 = 1;
pub const MAX_HISTORY_HOURS: i64 = 168;

/// One historical sample for a device.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryRow {
    pub time: DateTime<Utc>,
    pub cpu_usage: Option<f64>,
    pub mem_usage: Option<f64>,
    pub bandwidth_in: Option<f64>,
    pub bandwidth_out: Option<f64>,
    pub response_time: Option<f64>,
}

/// Destination for poll results.
pub trait MetricsSink: Send + Sync {
    fn write<'a>(&'a self, result: &'a PollResult) -> BoxFuture<'a, Result<(), CoreError>>;

    /// Samples for the device at `device_ip` over the last `hours`
    /// (clamped to 1..=168). Empty on invalid input or any failure.
    fn query_history<'a>(&'a self, device_ip: &'a str, hours: i64) -> BoxFuture<'a, Vec<HistoryRow>>;
}

/// Sink used when no time-series backend is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl MetricsSink for NullSink {
    fn write<'a>(&'a self, _result: &'a PollResult) -> BoxFuture<'a, Result<(), CoreError>> {
        Box::pin(async { Ok(()) })
    }

    fn query_history<'a>(&'a self, _device_ip: &'a str, _hours: i64) -> BoxFuture<'a, Vec<HistoryRow>> {
        Box::pin(async { Vec::new() })
    }
}

pub fn clamp_hours(hours: i64) -> i64 {
    hours.clamp(MIN_HISTORY_HOURS, MAX_HISTORY_HOURS)
}

/// Escape a value for a Flux string literal, rejecting characters that
/// could splice extra pipeline stages into the query.
pub fn sanitize_flux_string(value: &str) -> Result<String, CoreError> {
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    if escaped.contains(['|', '>', '(', ')', '{', '}', '[', ']']) {
        return Err(CoreError::InvalidQuery {
            value: value.to_owned(),
        });
    }
    Ok(escaped)
}

/// Build the `device_metrics` point for a result. `None` for results
/// without metrics.
pub fn to_point(result: &PollResult) -> Option<Point> {
    let metrics = result.metrics.as_ref()?;
    let device = &result.device;

    let mut point = Point::new(MEASUREMENT)
        .tag("device_ip", device.endpoint.host.as_str())
        .tag("device_name", device.name.as_str())
        .tag("device_type", device.device_type.to_string())
        .tag("status", result.status.to_string())
        .field("cpu_usage", metrics.cpu_usage)
        .field("mem_usage", metrics.mem_usage)
        .field("bandwidth_in", metrics.bandwidth_in)
        .field("bandwidth_out", metrics.bandwidth_out);
    if let Some(uptime) = metrics.uptime_secs {
        point = point.field("uptime", i64::try_from(uptime).unwrap_or(i64::MAX));
    }
    Some(
        point
            .field("response_time", metrics.response_time_ms)
            .timestamp(result.polled_at),
    )
}

/// Sink backed by an InfluxDB v2 bucket.
pub struct InfluxSink {
    client: InfluxClient,
}

impl InfluxSink {
    pub fn new(client: InfluxClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &InfluxClient {
        &self.client
    }

    fn history_query(&self, device_ip: &str, hours: i64) -> Result<String, CoreError> {
        let ip = sanitize_flux_string(device_ip)?;
        let bucket = sanitize_flux_string(&self.client.config().bucket)?;
        Ok(format!(
            "from(bucket: \"{bucket}\")\n\
             \x20 |> range(start: -{hours}h)\n\
             \x20 |> filter(fn: (r) => r[\"_measurement\"] == \"{MEASUREMENT}\")\n\
             \x20 |> filter(fn: (r) => r[\"device_ip\"] == \"{ip}\")\n\
             \x20 |> pivot(rowKey: [\"_time\"], columnKey: [\"_field\"], valueColumn: \"_value\")"
        ))
    }

    async fn history(&self, device_ip: &str, hours: i64) -> Vec<HistoryRow> {
        let hours = clamp_hours(hours);
        let flux = match self.history_query(device_ip, hours) {
            Ok(flux) => flux,
            Err(e) => {
                warn!(error = %e, "rejected history query");
                return Vec::new();
            }
        };
        match self.client.query(&flux).await {
            Ok(rows) => rows.iter().filter_map(history_row).collect(),
            Err(e) => {
                error!(error = %e, device_ip, "history query failed");
                Vec::new()
            }
        }
    }
}

fn history_row(row: &Row) -> Option<HistoryRow> {
    let time = DateTime::parse_from_rfc3339(row.get("_time")?)
        .ok()?
        .with_timezone(&Utc);
    let field = |name: &str| row.get(name).and_then(|v| v.parse::<f64>().ok());
    Some(HistoryRow {
        time,
        cpu_usage: field("cpu_usage"),
        mem_usage: field("mem_usage"),
        bandwidth_in: field("bandwidth_in"),
        bandwidth_out: field("bandwidth_out"),
        response_time: field("response_time"),
    })
}

impl MetricsSink for InfluxSink {
    fn write<'a>(&'a self, result: &'a PollResult) -> BoxFuture<'a, Result<(), CoreError>> {
        Box::pin(async move {
            let Some(point) = to_point(result) else {
                return Ok(());
            };
            self.client
                .write(std::slice::from_ref(&point))
                .await
                .map_err(|e| CoreError::Sink {
                    message: e.to_string(),
                })?;
            debug!(device = %result.device.name, "wrote metrics");
            Ok(())
        })
    }

    fn query_history<'a>(&'a self, device_ip: &'a str, hours: i64) -> BoxFuture<'a, Vec<HistoryRow>> {
        Box::pin(self.history(device_ip, hours))
    }
}
