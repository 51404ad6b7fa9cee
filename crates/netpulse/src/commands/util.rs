//! Shared helpers for command handlers.

use std::sync::Arc;

use tracing::info;

use netpulse_api::influx::InfluxClient;
use netpulse_config::{Config, load_config};
use netpulse_core::{InfluxSink, MetricsSink, NullSink, Poller, StaticInventory};

use crate::cli::GlobalOpts;
use crate::error::CliError;

pub fn config(global: &GlobalOpts) -> Result<Config, CliError> {
    Ok(load_config(global.config.as_deref())?)
}

/// The InfluxDB sink when a token is configured, otherwise a sink that
/// drops everything.
pub fn sink(config: &Config) -> Result<Arc<dyn MetricsSink>, CliError> {
    match config.influx_config()? {
        Some(influx) => {
            info!(url = %influx.url, bucket = %influx.bucket, "recording metrics in InfluxDB");
            Ok(Arc::new(InfluxSink::new(InfluxClient::new(influx)?)))
        }
        None => {
            info!("no InfluxDB token configured, metrics are not recorded");
            Ok(Arc::new(NullSink))
        }
    }
}

pub fn poller(config: &Config, inventory: StaticInventory) -> Result<Poller, CliError> {
    Ok(Poller::new(
        config.poller_config()?,
        Arc::new(inventory),
        sink(config)?,
    ))
}
