// InfluxDB v2 client: line-protocol writes and Flux CSV queries.

pub mod client;
pub mod csv;
pub mod point;

pub use client::{Health, InfluxClient, InfluxConfig};
pub use csv::Row;
pub use point::{FieldValue, Point};
