//! Inventory listing.

use tabled::Tabled;

use netpulse_config::Config;
use netpulse_core::DeviceDescriptor;

use crate::cli::{DevicesArgs, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Endpoint")]
    endpoint: String,
    #[tabled(rename = "Type")]
    dtype: String,
    #[tabled(rename = "Interface")]
    interface: String,
    #[tabled(rename = "Community")]
    community: String,
}

impl DeviceRow {
    fn new(d: &DeviceDescriptor, config: &Config) -> Self {
        let community = if config.credentials.overrides.contains_key(&d.name) {
            "override"
        } else {
            "default"
        };
        Self {
            id: d.id.clone(),
            name: d.name.clone(),
            endpoint: d.endpoint.to_string(),
            dtype: d.device_type.to_string(),
            interface: format!("{} ({}-bit)", d.interface_index, u8::from(d.counter_width)),
            community: community.into(),
        }
    }
}

pub fn handle(args: &DevicesArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let config = util::config(global)?;
    let inventory = config.inventory()?;
    if config.devices.is_empty() {
        tracing::warn!("no devices configured, showing the demo inventory");
    }

    let rendered = if args.json {
        output::render_json(inventory.devices())?
    } else {
        let rows: Vec<DeviceRow> = inventory
            .devices()
            .iter()
            .map(|d| DeviceRow::new(d, &config))
            .collect();
        output::render_table(&rows)
    };
    output::print_output(&rendered);
    Ok(())
}
