// Scripted agents for poller tests.
#![allow(clippy::unwrap_used, dead_code)]

use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::future::BoxFuture;
use secrecy::SecretString;

use netpulse_api::snmp::oids::{self, column, oid};
use netpulse_api::snmp::{Oid, Target, Value, VarBind};
use netpulse_core::config::{Credentials, PollerConfig, TransportConfig};
use netpulse_core::{DeviceDescriptor, DeviceType, Endpoint, Exchange};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Behavior {
    Normal,
    /// Every exchange panics.
    Panic,
    /// Every exchange never completes.
    Hang,
    /// Every exchange answers after this delay.
    Slow(Duration),
}

struct Agent {
    mib: BTreeMap<Oid, Value>,
    behavior: Behavior,
}

/// A set of fake agents keyed by host. Unknown hosts time out.
#[derive(Default)]
pub struct FakeNetwork {
    agents: Mutex<HashMap<String, Agent>>,
    identity_queries: Mutex<HashMap<String, usize>>,
    identity_in_flight: Arc<Mutex<InFlight>>,
}

#[derive(Default)]
struct InFlight {
    now: usize,
    peak: usize,
}

/// Counts one identity exchange as in flight until dropped.
struct InFlightGuard(Arc<Mutex<InFlight>>);

impl InFlightGuard {
    fn enter(counter: &Arc<Mutex<InFlight>>) -> Self {
        let mut c = counter.lock().unwrap();
        c.now += 1;
        c.peak = c.peak.max(c.now);
        drop(c);
        Self(Arc::clone(counter))
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.lock().unwrap().now -= 1;
    }
}

impl FakeNetwork {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn add(&self, host: &str, mib: BTreeMap<Oid, Value>, behavior: Behavior) {
        self.agents
            .lock()
            .unwrap()
            .insert(host.to_owned(), Agent { mib, behavior });
    }

    pub fn set(&self, host: &str, id: Oid, value: Value) {
        self.agents
            .lock()
            .unwrap()
            .get_mut(host)
            .unwrap()
            .mib
            .insert(id, value);
    }

    /// How many times the system-group query hit `host`.
    pub fn identity_queries(&self, host: &str) -> usize {
        self.identity_queries
            .lock()
            .unwrap()
            .get(host)
            .copied()
            .unwrap_or(0)
    }

    /// Most identity exchanges ever outstanding at once, across all hosts.
    pub fn peak_identity_in_flight(&self) -> usize {
        self.identity_in_flight.lock().unwrap().peak
    }

    fn behavior(&self, host: &str) -> Option<Behavior> {
        self.agents.lock().unwrap().get(host).map(|a| a.behavior)
    }
}

async fn misbehave(behavior: Behavior) {
    match behavior {
        Behavior::Normal => {}
        Behavior::Panic => panic!("agent exploded"),
        Behavior::Hang => std::future::pending::<()>().await,
        Behavior::Slow(delay) => tokio::time::sleep(delay).await,
    }
}

fn no_answer() -> netpulse_api::Error {
    netpulse_api::Error::Timeout {
        attempts: 1,
        timeout_ms: 1,
    }
}

type ExchangeResult = Result<Vec<VarBind>, netpulse_api::Error>;

impl Exchange for FakeNetwork {
    fn get<'a>(&'a self, target: &'a Target, ids: &'a [Oid]) -> BoxFuture<'a, ExchangeResult> {
        Box::pin(async move {
            let identity = ids.first() == Some(&oid(oids::SYS_DESCR));
            let _in_flight = identity.then(|| InFlightGuard::enter(&self.identity_in_flight));
            if identity {
                *self
                    .identity_queries
                    .lock()
                    .unwrap()
                    .entry(target.host.clone())
                    .or_default() += 1;
            }
            let behavior = self.behavior(&target.host).ok_or_else(no_answer)?;
            misbehave(behavior).await;

            let agents = self.agents.lock().unwrap();
            let mib = &agents[&target.host].mib;
            Ok(ids
                .iter()
                .map(|id| {
                    let value = mib.get(id).cloned().unwrap_or(Value::NoSuchObject);
                    VarBind::new(id.clone(), value)
                })
                .collect())
        })
    }

    fn get_next<'a>(&'a self, target: &'a Target, id: &'a Oid) -> BoxFuture<'a, ExchangeResult> {
        Box::pin(async move {
            let behavior = self.behavior(&target.host).ok_or_else(no_answer)?;
            misbehave(behavior).await;

            let agents = self.agents.lock().unwrap();
            let mib = &agents[&target.host].mib;
            let next = mib
                .range((Bound::Excluded(id.clone()), Bound::Unbounded))
                .next()
                .map(|(k, v)| VarBind::new(k.clone(), v.clone()))
                .unwrap_or_else(|| VarBind::new(id.clone(), Value::EndOfMibView));
            Ok(vec![next])
        })
    }
}

/// A healthy host: two CPUs at 10% and 30%, 4 GiB RAM half used, a day of
/// uptime, interface 1 counters at zero.
pub fn healthy_mib(name: &str) -> BTreeMap<Oid, Value> {
    let mut mib = BTreeMap::new();
    mib.insert(
        oid(oids::SYS_DESCR),
        Value::OctetString(format!("Linux {name} 6.1.0").into_bytes()),
    );
    mib.insert(oid(oids::SYS_OBJECT_ID), Value::ObjectId("1.3.6.1.4.1.9.1.1208".parse().unwrap()));
    mib.insert(oid(oids::SYS_UPTIME), Value::TimeTicks(8_640_000));
    mib.insert(oid(oids::SYS_NAME), Value::OctetString(name.as_bytes().to_vec()));
    mib.insert(oid(oids::SYS_LOCATION), Value::OctetString(b"Rack 4".to_vec()));

    mib.insert(column(oids::HR_PROCESSOR_LOAD, 196_608), Value::Integer(10));
    mib.insert(column(oids::HR_PROCESSOR_LOAD, 196_609), Value::Integer(30));

    mib.insert(column(oids::HR_STORAGE_DESCR, 1), Value::OctetString(b"/".to_vec()));
    mib.insert(
        column(oids::HR_STORAGE_DESCR, 3),
        Value::OctetString(b"Physical memory".to_vec()),
    );
    mib.insert(column(oids::HR_STORAGE_ALLOCATION_UNITS, 3), Value::Integer(1024));
    mib.insert(column(oids::HR_STORAGE_SIZE, 3), Value::Integer(4_194_304));
    mib.insert(column(oids::HR_STORAGE_USED, 3), Value::Integer(2_097_152));

    mib.insert(column(oids::IF_IN_OCTETS, 1), Value::Counter32(0));
    mib.insert(column(oids::IF_OUT_OCTETS, 1), Value::Counter32(0));
    mib
}

pub fn device(id: &str, host: &str) -> DeviceDescriptor {
    DeviceDescriptor::new(
        id,
        format!("dev-{id}"),
        Endpoint::new(host, 161),
        DeviceType::Switch,
    )
}

/// Short intervals, generous exchange timeout (10 s overall).
pub fn test_config() -> PollerConfig {
    PollerConfig {
        poll_interval: Duration::from_secs(1),
        error_backoff: Duration::from_secs(5),
        shutdown_timeout: Duration::from_secs(10),
        transport: TransportConfig {
            timeout: Duration::from_secs(5),
            retries: 1,
        },
        credentials: Credentials::new(SecretString::from("public".to_owned())),
        ..PollerConfig::default()
    }
}
