//! Continuous polling until interrupted.

use std::collections::HashSet;

use tracing::info;

use crate::cli::{GlobalOpts, RunArgs};
use crate::error::CliError;
use crate::output;

use super::{poll, util};

pub async fn handle(args: RunArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let mut config = util::config(global)?;
    if let Some(secs) = args.interval {
        config.poller.interval_secs = secs;
    }
    let inventory = config.inventory()?;
    let expected = inventory.devices().len();
    let poller = util::poller(&config, inventory)?;
    let color = output::should_color(global.color);

    let mut updates = poller.subscribe();
    poller.start()?;
    info!(devices = expected, "polling, press Ctrl-C to stop");

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    // A cycle is complete once every device has reported since the last
    // table.
    let mut reported: HashSet<String> = HashSet::new();
    loop {
        tokio::select! {
            signal = &mut shutdown => {
                signal?;
                break;
            }
            fresh = updates.next_results() => {
                let Some(fresh) = fresh else { break };
                reported.extend(fresh.iter().map(|r| r.key().to_owned()));
                if reported.len() < expected {
                    continue;
                }
                reported.clear();
                output::print_output(&poll::status_table(updates.current(), color));
            }
        }
    }

    info!("stopping");
    poller.stop().await;
    Ok(())
}
