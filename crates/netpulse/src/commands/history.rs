//! Stored metric history from InfluxDB.

use tabled::Tabled;

use netpulse_api::influx::InfluxClient;
use netpulse_core::sink::clamp_hours;
use netpulse_core::{HistoryRow, InfluxSink, MetricsSink};

use crate::cli::{GlobalOpts, HistoryArgs};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct SampleRow {
    #[tabled(rename = "Time")]
    time: String,
    #[tabled(rename = "CPU")]
    cpu: String,
    #[tabled(rename = "Memory")]
    memory: String,
    #[tabled(rename = "In (Mbps)")]
    bandwidth_in: String,
    #[tabled(rename = "Out (Mbps)")]
    bandwidth_out: String,
    #[tabled(rename = "Resp (ms)")]
    response: String,
}

impl From<&HistoryRow> for SampleRow {
    fn from(row: &HistoryRow) -> Self {
        let show = |value: Option<f64>, fmt: fn(f64) -> String| value.map_or_else(|| "-".into(), fmt);
        Self {
            time: row.time.format("%Y-%m-%d %H:%M:%S").to_string(),
            cpu: show(row.cpu_usage, output::format_percent),
            memory: show(row.mem_usage, output::format_percent),
            bandwidth_in: show(row.bandwidth_in, output::format_mbps),
            bandwidth_out: show(row.bandwidth_out, output::format_mbps),
            response: show(row.response_time, |v| format!("{v:.2}")),
        }
    }
}

pub async fn handle(args: HistoryArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let config = util::config(global)?;
    let influx = config.require_influx()?;
    let url = influx.url.to_string();
    let client = InfluxClient::new(influx)?;

    let health = client
        .health()
        .await
        .map_err(|source| CliError::InfluxUnreachable { url, source })?;
    if !health.is_pass() {
        tracing::warn!(status = %health.status, message = ?health.message, "InfluxDB reports unhealthy");
    }

    let hours = clamp_hours(args.hours);
    let rows = InfluxSink::new(client).query_history(&args.ip, hours).await;

    let rendered = if args.json {
        output::render_json(&rows)?
    } else if rows.is_empty() {
        let unit = if hours == 1 { "hour" } else { "hours" };
        format!("No samples for {} in the last {hours} {unit}", args.ip)
    } else {
        let table: Vec<SampleRow> = rows.iter().map(SampleRow::from).collect();
        output::render_table(&table)
    };
    output::print_output(&rendered);
    Ok(())
}
