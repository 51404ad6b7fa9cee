//! Output formatting: tables, JSON, and human-readable values.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use tabled::{Table, Tabled, settings::Style};

use netpulse_core::DeviceStatus;

use crate::cli::ColorMode;
use crate::error::CliError;

// ── Color ────────────────────────────────────────────────────────────

/// Determine whether color output should be enabled.
pub fn should_color(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

pub fn status_label(status: DeviceStatus, color: bool) -> String {
    let label = status.to_string();
    if !color {
        return label;
    }
    match status {
        DeviceStatus::Online => label.green().to_string(),
        DeviceStatus::Warning => label.yellow().to_string(),
        DeviceStatus::Offline => label.bright_black().to_string(),
        DeviceStatus::Error => label.red().bold().to_string(),
    }
}

// ── Renderers ────────────────────────────────────────────────────────

pub fn render_table<R: Tabled>(rows: &[R]) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

pub fn render_json<T: serde::Serialize + ?Sized>(data: &T) -> Result<String, CliError> {
    Ok(serde_json::to_string_pretty(data)?)
}

/// Print to stdout, ignoring a closed pipe.
pub fn print_output(output: &str) {
    if output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

// ── Values ───────────────────────────────────────────────────────────

/// "2 days, 3 hours, 1 minute", down to seconds; zero components are
/// omitted, and zero overall is "0 seconds".
pub fn format_uptime(seconds: u64) -> String {
    let units = [
        (seconds / 86_400, "day"),
        ((seconds % 86_400) / 3600, "hour"),
        ((seconds % 3600) / 60, "minute"),
        (seconds % 60, "second"),
    ];
    let parts: Vec<String> = units
        .iter()
        .filter(|(n, _)| *n > 0)
        .map(|(n, unit)| {
            if *n == 1 {
                format!("{n} {unit}")
            } else {
                format!("{n} {unit}s")
            }
        })
        .collect();

    if parts.is_empty() {
        "0 seconds".into()
    } else {
        parts.join(", ")
    }
}

pub fn format_mbps(value: f64) -> String {
    format!("{value:.3}")
}

pub fn format_percent(value: f64) -> String {
    format!("{value:.1}%")
}

pub fn or_dash(value: Option<&str>) -> String {
    value.filter(|s| !s.is_empty()).unwrap_or("-").to_owned()
}
