// netpulse-core: polling engine between netpulse-api and consumers (CLI).

pub mod config;
pub mod error;
pub mod inventory;
pub mod metrics;
pub mod model;
pub mod poll;
pub mod poller;
pub mod sink;
pub mod store;
pub mod stream;
pub mod transport;
pub mod value;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{CpuSource, Credentials, MemorySource, PollerConfig, TransportConfig};
pub use error::CoreError;
pub use inventory::{Inventory, StaticInventory};
pub use poller::{Poller, PollerState};
pub use sink::{HistoryRow, InfluxSink, MetricsSink, NullSink};
pub use store::{CounterStore, DeviceStore};
pub use stream::{DeviceStream, DeviceUpdates};
pub use transport::{Exchange, Transport};
pub use value::PlainValue;

pub use model::{
    CounterWidth, DeviceDescriptor, DeviceStatus, DeviceType, Endpoint, MetricsBundle, PollResult,
    SystemInfo,
};
