// ── Poller state ──
//
// Latest results per device and the counter history bandwidth needs.

mod counters;
mod devices;

pub use counters::CounterStore;
pub use devices::DeviceStore;
