//! Clap derive structures for the `netpulse` CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// netpulse: poll network devices over SNMP and report their health
#[derive(Debug, Parser)]
#[command(
    name = "netpulse",
    version,
    about = "Poll network devices over SNMP and report their health",
    long_about = "Poll network devices over SNMP and report their health.\n\n\
        Samples CPU, memory, bandwidth and reachability from every configured \n\
        device on a fixed cadence and optionally records them in InfluxDB.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Configuration file (defaults to the platform config directory)
    #[arg(long, short = 'c', env = "NETPULSE_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ColorMode {
    /// Color when stdout is a terminal
    Auto,
    Always,
    Never,
}

// ── Commands ─────────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Poll continuously, printing a status table after every cycle
    Run(RunArgs),

    /// Run a single poll cycle and print the results
    Poll(PollArgs),

    /// List the configured device inventory
    #[command(alias = "dev")]
    Devices(DevicesArgs),

    /// Show recorded metrics for a device from InfluxDB
    History(HistoryArgs),

    /// Inspect the effective configuration
    Config(ConfigArgs),
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Seconds between poll cycles (overrides poller.interval_secs)
    #[arg(long, short = 'i')]
    pub interval: Option<u64>,
}

#[derive(Debug, Args)]
pub struct PollArgs {
    /// Print results as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct DevicesArgs {
    /// Print the inventory as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct HistoryArgs {
    /// Device IP address (as configured in the inventory)
    pub ip: String,

    /// How far back to look, in hours (1-168)
    #[arg(long, short = 'H', default_value_t = 1)]
    pub hours: i64,

    /// Print rows as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the effective configuration with secrets masked
    Show,

    /// Print the config file path
    Path,
}
