// ── Value normalization ──
//
// Collapse protocol-typed values into the two shapes metric code cares
// about: integers and text.

use std::fmt;
use std::fmt::Write as _;

use serde::Serialize;

use netpulse_api::snmp::Value;

/// A protocol value reduced to a plain integer or string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PlainValue {
    Integer(i128),
    Text(String),
}

impl PlainValue {
    pub fn as_integer(&self) -> Option<i128> {
        match self {
            Self::Integer(v) => Some(*v),
            Self::Text(_) => None,
        }
    }

    #[allow(clippy::cast_precision_loss, clippy::as_conversions)]
    pub fn as_f64(&self) -> Option<f64> {
        self.as_integer().map(|v| v as f64)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Integer(_) => None,
        }
    }
}

impl fmt::Display for PlainValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(v) => write!(f, "{v}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// Normalize one varbind value. Never fails.
pub fn normalize(value: &Value) -> PlainValue {
    match value {
        Value::Integer(v) => PlainValue::Integer(i128::from(*v)),
        Value::Counter32(v) | Value::Gauge32(v) => PlainValue::Integer(i128::from(*v)),
        Value::Counter64(v) => PlainValue::Integer(i128::from(*v)),
        // Hundredths of a second to whole seconds.
        Value::TimeTicks(v) => PlainValue::Integer(i128::from(*v / 100)),
        Value::OctetString(bytes) | Value::Opaque(bytes) => PlainValue::Text(octets_to_text(bytes)),
        Value::IpAddress(addr) => PlainValue::Text(addr.to_string()),
        Value::ObjectId(oid) => PlainValue::Text(oid.to_string()),
        Value::Null => PlainValue::Text(String::new()),
        Value::NoSuchObject => PlainValue::Text("No Such Object currently exists at this OID".into()),
        Value::NoSuchInstance => {
            PlainValue::Text("No Such Instance currently exists at this OID".into())
        }
        Value::EndOfMibView => PlainValue::Text("No more variables left in this MIB View".into()),
        Value::Other { data, .. } => PlainValue::Text(hex(data)),
    }
}

/// UTF-8 text when it decodes and is printable, lowercase `0x` hex otherwise.
fn octets_to_text(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) if s.chars().all(|c| !c.is_control() || matches!(c, '\n' | '\r' | '\t')) => {
            s.to_owned()
        }
        _ => hex(bytes),
    }
}

fn hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(2 + bytes.len() * 2);
    out.push_str("0x");
    for b in bytes {
        let _ = write!(out, "{b:02x}");
    }
    out
}
