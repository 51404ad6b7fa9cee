// Loading configuration files from disk.
#![allow(clippy::unwrap_used)]

use std::io::Write;
use std::time::Duration;

use pretty_assertions::assert_eq;

use netpulse_config::{ConfigError, load_config};

#[test]
fn test_load_explicit_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[poller]
interval_secs = 15

[snmp]
timeout_ms = 500
retries = 3

[[devices]]
id = "edge"
name = "Edge"
endpoint = "[2001:db8::1]:1161"
type = "firewall"
"#
    )
    .unwrap();

    let config = load_config(Some(file.path())).unwrap();
    let poller = config.poller_config_with(|_| None).unwrap();
    assert_eq!(poller.poll_interval, Duration::from_secs(15));
    assert_eq!(poller.transport.total_timeout(), Duration::from_secs(2));

    let inventory = config.inventory().unwrap();
    let edge = &inventory.devices()[0];
    assert_eq!(edge.endpoint.host, "2001:db8::1");
    assert_eq!(edge.endpoint.port, 1161);
    assert_eq!(edge.interface_index, 1);
}

#[test]
fn test_missing_explicit_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_config(Some(&dir.path().join("absent.toml"))).unwrap_err();
    assert!(matches!(err, ConfigError::Io(_)));
}

#[test]
fn test_malformed_values_fail_extraction() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[[devices]]\nid = \"x\"\nname = \"X\"\nendpoint = \"host:0\"").unwrap();

    let err = load_config(Some(file.path())).unwrap_err();
    assert!(matches!(err, ConfigError::Figment(_)));
}
