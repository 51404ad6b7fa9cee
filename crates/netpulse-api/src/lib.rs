// netpulse-api: async wire clients for netpulse (SNMP v2c + InfluxDB v2)

pub mod error;
pub mod influx;
pub mod snmp;

pub use error::Error;
pub use influx::{InfluxClient, InfluxConfig};
pub use snmp::{Oid, SnmpClient, Target, TransportConfig, Value, VarBind};
