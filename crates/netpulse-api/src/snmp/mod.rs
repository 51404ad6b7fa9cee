// SNMP v2c wire layer: BER codec, message types, UDP client.

pub(crate) mod ber;
pub mod client;
pub mod oid;
pub mod oids;
pub mod pdu;

pub use client::{SnmpClient, Target, TransportConfig};
pub use oid::Oid;
pub use pdu::{Message, Pdu, PduType, Value, VarBind};
