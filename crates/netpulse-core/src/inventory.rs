// ── Device inventory ──

use futures_util::future::BoxFuture;

use crate::error::CoreError;
use crate::model::{DeviceDescriptor, DeviceType, Endpoint};

/// Source of the devices to poll, consulted once per cycle.
pub trait Inventory: Send + Sync {
    fn list_devices(&self) -> BoxFuture<'_, Result<Vec<DeviceDescriptor>, CoreError>>;
}

/// A fixed device list, usually built from configuration.
#[derive(Debug, Clone, Default)]
pub struct StaticInventory {
    devices: Vec<DeviceDescriptor>,
}

impl StaticInventory {
    pub fn new(devices: Vec<DeviceDescriptor>) -> Self {
        Self { devices }
    }

    /// Two sample devices for running without any configuration.
    pub fn demo() -> Self {
        Self::new(vec![
            DeviceDescriptor::new(
                "001",
                "Router-main",
                Endpoint::new("142.62.147.56", Endpoint::DEFAULT_PORT),
                DeviceType::Router,
            ),
            DeviceDescriptor::new(
                "010",
                "Switch-3rdFloor",
                Endpoint::new("234.218.156.241", Endpoint::DEFAULT_PORT),
                DeviceType::Switch,
            ),
        ])
    }

    pub fn devices(&self) -> &[DeviceDescriptor] {
        &self.devices
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}

impl Inventory for StaticInventory {
    fn list_devices(&self) -> BoxFuture<'_, Result<Vec<DeviceDescriptor>, CoreError>> {
        let devices = self.devices.clone();
        Box::pin(async move { Ok(devices) })
    }
}
