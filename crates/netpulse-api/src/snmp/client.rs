// SNMP v2c UDP client
//
// One exchange = one fresh socket. The socket is connected to the resolved
// agent address so the kernel filters foreign datagrams; anything that
// still fails to decode or carries a stale request-id is skipped until the
// attempt deadline.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicI32, Ordering};
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use tokio::net::UdpSocket;
use tokio::time::{Instant, timeout_at};
use tracing::{debug, trace};

use super::oid::Oid;
use super::pdu::{Message, Pdu, PduType, VarBind};
use crate::error::Error;

/// Largest datagram we accept from an agent.
const MAX_DATAGRAM: usize = 65_507;

/// Per-attempt timeout and retry budget for SNMP exchanges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportConfig {
    pub timeout: Duration,
    pub retries: u32,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(2),
            retries: 1,
        }
    }
}

impl TransportConfig {
    /// Worst-case wall time of one exchange: every attempt timing out.
    pub fn total_timeout(&self) -> Duration {
        self.timeout.saturating_mul(self.retries.saturating_add(1))
    }
}

/// Where and how to reach one agent.
#[derive(Debug, Clone)]
pub struct Target {
    pub host: String,
    pub port: u16,
    pub community: SecretString,
}

impl Target {
    pub fn new(host: impl Into<String>, port: u16, community: SecretString) -> Self {
        Self {
            host: host.into(),
            port,
            community,
        }
    }
}

/// Async SNMP v2c client.
///
/// Stateless between exchanges apart from the request-id counter, so a
/// single instance is shared by every device poll in a cycle.
#[derive(Debug)]
pub struct SnmpClient {
    config: TransportConfig,
    next_request_id: AtomicI32,
}

impl SnmpClient {
    pub fn new(config: TransportConfig) -> Self {
        Self {
            config,
            next_request_id: AtomicI32::new(1),
        }
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    /// Point query: GET every identifier in one PDU.
    pub async fn get(&self, target: &Target, oids: &[Oid]) -> Result<Vec<VarBind>, Error> {
        self.exchange(target, PduType::GetRequest, oids).await
    }

    /// GET-NEXT for a single identifier; the agent answers with the
    /// lexicographic successor.
    pub async fn get_next(&self, target: &Target, oid: &Oid) -> Result<Vec<VarBind>, Error> {
        self.exchange(target, PduType::GetNextRequest, std::slice::from_ref(oid))
            .await
    }

    fn request_id(&self) -> i32 {
        // Stay positive; some agents mishandle negative request-ids.
        self.next_request_id.fetch_add(1, Ordering::Relaxed) & i32::MAX
    }

    async fn exchange(
        &self,
        target: &Target,
        kind: PduType,
        oids: &[Oid],
    ) -> Result<Vec<VarBind>, Error> {
        let addr = resolve(&target.host, target.port).await?;
        let request_id = self.request_id();
        let request = Message::new(
            target.community.expose_secret().as_bytes(),
            Pdu::request(kind, request_id, oids),
        )
        .encode()?;

        let bind: SocketAddr = if addr.is_ipv4() {
            SocketAddr::from(([0, 0, 0, 0], 0))
        } else {
            SocketAddr::from(([0u16; 8], 0))
        };
        let socket = UdpSocket::bind(bind).await?;
        socket.connect(addr).await?;

        let attempts = self.config.retries.saturating_add(1);
        let mut buf = vec![0u8; MAX_DATAGRAM];

        for attempt in 1..=attempts {
            trace!(%addr, request_id, attempt, ?kind, "sending SNMP request");
            socket.send(&request).await?;
            let deadline = Instant::now() + self.config.timeout;

            loop {
                let Ok(received) = timeout_at(deadline, socket.recv(&mut buf)).await else {
                    debug!(%addr, request_id, attempt, "SNMP attempt timed out");
                    break;
                };
                let len = received?;
                let response = match Message::decode(&buf[..len]) {
                    Ok(msg) => msg,
                    Err(e) => {
                        debug!(%addr, error = %e, "discarding undecodable datagram");
                        continue;
                    }
                };
                if response.pdu.kind != PduType::Response
                    || response.pdu.request_id != request_id
                {
                    trace!(
                        %addr,
                        expected = request_id,
                        got = response.pdu.request_id,
                        "discarding unrelated datagram"
                    );
                    continue;
                }
                if response.pdu.error_status != 0 {
                    return Err(Error::Protocol {
                        status: response.pdu.error_status,
                        index: response.pdu.error_index,
                    });
                }
                return Ok(response.pdu.varbinds);
            }
        }

        Err(Error::Timeout {
            attempts,
            timeout_ms: u64::try_from(self.config.timeout.as_millis()).unwrap_or(u64::MAX),
        })
    }
}

impl Default for SnmpClient {
    fn default() -> Self {
        Self::new(TransportConfig::default())
    }
}

async fn resolve(host: &str, port: u16) -> Result<SocketAddr, Error> {
    tokio::net::lookup_host((host, port))
        .await
        .map_err(|_| Error::Resolve {
            host: host.to_owned(),
        })?
        .next()
        .ok_or_else(|| Error::Resolve {
            host: host.to_owned(),
        })
}
