// ── Soft-fail protocol transport ──
//
// Wraps the wire client so that nothing a device does on the network can
// fail a poll: timeouts and protocol errors become empty results, walks
// return whatever they gathered before stopping.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::BoxFuture;
use tokio::time::timeout;
use tracing::debug;

use netpulse_api::snmp::{Oid, SnmpClient, Target, TransportConfig, VarBind};

use crate::value::{PlainValue, normalize};

type ExchangeResult = Result<Vec<VarBind>, netpulse_api::Error>;

/// One request/response round-trip with an agent.
///
/// Implemented by [`SnmpClient`]; tests substitute scripted agents.
pub trait Exchange: Send + Sync {
    fn get<'a>(&'a self, target: &'a Target, oids: &'a [Oid]) -> BoxFuture<'a, ExchangeResult>;

    fn get_next<'a>(&'a self, target: &'a Target, oid: &'a Oid) -> BoxFuture<'a, ExchangeResult>;
}

impl Exchange for SnmpClient {
    fn get<'a>(&'a self, target: &'a Target, oids: &'a [Oid]) -> BoxFuture<'a, ExchangeResult> {
        Box::pin(SnmpClient::get(self, target, oids))
    }

    fn get_next<'a>(&'a self, target: &'a Target, oid: &'a Oid) -> BoxFuture<'a, ExchangeResult> {
        Box::pin(SnmpClient::get_next(self, target, oid))
    }
}

/// Point queries and bounded walks that never return an error.
#[derive(Clone)]
pub struct Transport {
    exchange: Arc<dyn Exchange>,
    /// Overall bound on one exchange, retries included.
    timeout: Duration,
    walk_limit: usize,
}

impl Transport {
    pub fn new(exchange: Arc<dyn Exchange>, config: &TransportConfig, walk_limit: usize) -> Self {
        Self {
            exchange,
            timeout: config.total_timeout(),
            walk_limit,
        }
    }

    /// GET every identifier in one exchange and map the answers back to
    /// the caller's names. Any failure yields an empty map; exception
    /// values (noSuchObject and friends) are left out.
    pub async fn query<K>(&self, target: &Target, requests: &[(K, Oid)]) -> HashMap<K, PlainValue>
    where
        K: Copy + Eq + Hash,
    {
        if requests.is_empty() {
            return HashMap::new();
        }
        let oids: Vec<Oid> = requests.iter().map(|(_, oid)| oid.clone()).collect();

        let varbinds = match timeout(self.timeout, self.exchange.get(target, &oids)).await {
            Ok(Ok(varbinds)) => varbinds,
            Ok(Err(e)) => {
                debug!(host = %target.host, error = %e, "SNMP GET failed");
                return HashMap::new();
            }
            Err(_) => {
                debug!(host = %target.host, timeout = ?self.timeout, "SNMP GET timed out");
                return HashMap::new();
            }
        };

        let mut out = HashMap::with_capacity(requests.len());
        for vb in varbinds {
            if vb.value.is_exception() {
                continue;
            }
            if let Some((key, _)) = requests.iter().find(|(_, oid)| *oid == vb.oid) {
                out.insert(*key, normalize(&vb.value));
            }
        }
        out
    }

    /// GET-NEXT from `base` until the agent leaves the subtree, reports the
    /// end of its view, fails, or `walk_limit` steps have run.
    pub async fn walk(&self, target: &Target, base: &Oid) -> Vec<(Oid, PlainValue)> {
        let mut rows = Vec::new();
        let mut cursor = base.clone();

        for _ in 0..self.walk_limit {
            let reply = match timeout(self.timeout, self.exchange.get_next(target, &cursor)).await {
                Ok(Ok(varbinds)) => varbinds,
                Ok(Err(e)) => {
                    debug!(host = %target.host, %base, error = %e, "SNMP walk stopped on error");
                    break;
                }
                Err(_) => {
                    debug!(host = %target.host, %base, "SNMP walk timed out");
                    break;
                }
            };
            let Some(vb) = reply.into_iter().next() else {
                break;
            };
            if vb.value.is_exception() || !vb.oid.starts_with(base) {
                break;
            }
            rows.push((vb.oid.clone(), normalize(&vb.value)));
            cursor = vb.oid;
        }

        rows
    }
}
