//! One-shot poll and the device status table shared with `run`.

use std::sync::Arc;

use tabled::Tabled;

use netpulse_core::PollResult;

use crate::cli::{GlobalOpts, PollArgs};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct StatusRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Endpoint")]
    endpoint: String,
    #[tabled(rename = "Status")]
    status: String,
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
    #[tabled(rename = "Uptime")]
    uptime: String,
    #[tabled(rename = "Vendor")]
    vendor: String,
}

impl StatusRow {
    fn new(result: &PollResult, color: bool) -> Self {
        let status = output::status_label(result.status, color);
        let system = result.system.as_ref();
        let vendor = output::or_dash(system.and_then(|s| s.vendor.as_deref()));

        let Some(m) = &result.metrics else {
            return Self {
                name: result.device.name.clone(),
                endpoint: result.device.endpoint.to_string(),
                status,
                cpu: "-".into(),
                memory: "-".into(),
                bandwidth_in: "-".into(),
                bandwidth_out: "-".into(),
                response: "-".into(),
                uptime: output::or_dash(result.error.as_deref()),
                vendor,
            };
        };

        Self {
            name: result.device.name.clone(),
            endpoint: result.device.endpoint.to_string(),
            status,
            cpu: output::format_percent(m.cpu_usage),
            memory: output::format_percent(m.mem_usage),
            bandwidth_in: output::format_mbps(m.bandwidth_in),
            bandwidth_out: output::format_mbps(m.bandwidth_out),
            response: format!("{:.2}", m.response_time_ms),
            uptime: m.uptime_secs.map_or_else(|| "-".into(), output::format_uptime),
            vendor,
        }
    }
}

pub(super) fn status_table(results: &[Arc<PollResult>], color: bool) -> String {
    let rows: Vec<StatusRow> = results.iter().map(|r| StatusRow::new(r, color)).collect();
    output::render_table(&rows)
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(args: PollArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let config = util::config(global)?;
    let poller = util::poller(&config, config.inventory()?)?;

    let polled = poller.poll_once().await?;
    tracing::debug!(devices = polled, "poll complete");

    let results = poller.store().snapshot();
    let rendered = if args.json {
        output::render_json(results.as_slice())?
    } else {
        status_table(&results, output::should_color(global.color))
    };
    output::print_output(&rendered);
    Ok(())
}
