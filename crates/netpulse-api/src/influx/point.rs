// ── Line protocol ──
//
// measurement[,tag=value...] field=value[,field=value...] [timestamp]

use std::fmt::Write as _;

use chrono::{DateTime, Utc};

/// A typed field value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Float(f64),
    Integer(i64),
    Boolean(bool),
    Text(String),
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        Self::Boolean(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_owned())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

/// One time-series point, built fluently:
///
/// ```
/// use netpulse_api::influx::Point;
///
/// let line = Point::new("device_metrics")
///     .tag("device_ip", "10.0.0.1")
///     .field("cpu_usage", 12.5)
///     .to_line_protocol();
/// assert_eq!(line.as_deref(), Some("device_metrics,device_ip=10.0.0.1 cpu_usage=12.5"));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    measurement: String,
    tags: Vec<(String, String)>,
    fields: Vec<(String, FieldValue)>,
    timestamp: Option<DateTime<Utc>>,
}

impl Point {
    pub fn new(measurement: impl Into<String>) -> Self {
        Self {
            measurement: measurement.into(),
            tags: Vec::new(),
            fields: Vec::new(),
            timestamp: None,
        }
    }

    pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.push((key.into(), value.into()));
        self
    }

    pub fn field(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.push((key.into(), value.into()));
        self
    }

    pub fn timestamp(mut self, ts: DateTime<Utc>) -> Self {
        self.timestamp = Some(ts);
        self
    }

    pub fn measurement(&self) -> &str {
        &self.measurement
    }

    /// Render as one line of line protocol with millisecond timestamps.
    ///
    /// Empty tag values and non-finite floats are dropped since the server
    /// rejects them. Returns `None` when no field survives.
    pub fn to_line_protocol(&self) -> Option<String> {
        let mut fields = String::new();
        for (key, value) in &self.fields {
            let rendered = match value {
                FieldValue::Float(v) if !v.is_finite() => continue,
                FieldValue::Float(v) => format!("{v}"),
                FieldValue::Integer(v) => format!("{v}i"),
                FieldValue::Boolean(v) => v.to_string(),
                FieldValue::Text(s) => format!("\"{}\"", escape_string_field(s)),
            };
            if !fields.is_empty() {
                fields.push(',');
            }
            fields.push_str(&escape_key(key));
            fields.push('=');
            fields.push_str(&rendered);
        }
        if fields.is_empty() {
            return None;
        }

        let mut line = escape_measurement(&self.measurement);
        for (key, value) in &self.tags {
            if value.is_empty() {
                continue;
            }
            let _ = write!(line, ",{}={}", escape_key(key), escape_key(value));
        }
        line.push(' ');
        line.push_str(&fields);
        if let Some(ts) = self.timestamp {
            let _ = write!(line, " {}", ts.timestamp_millis());
        }
        Some(line)
    }
}

fn escape_measurement(s: &str) -> String {
    escape(s, &[',', ' '])
}

/// Tag keys, tag values and field keys share one escaping rule.
fn escape_key(s: &str) -> String {
    escape(s, &[',', '=', ' '])
}

fn escape_string_field(s: &str) -> String {
    escape(s, &['"', '\\'])
}

fn escape(s: &str, special: &[char]) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if special.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
