// ── SNMP v2c messages ──
//
// Message ::= SEQUENCE { version INTEGER (1), community OCTET STRING, PDU }
// PDU      ::= [tag] { request-id, error-status, error-index, varbinds }

use std::net::Ipv4Addr;

use bytes::{Bytes, BytesMut};

use super::ber::{self, Reader, tag};
use super::oid::Oid;
use crate::error::Error;

/// SNMP v2c wire version number.
const VERSION_2C: i64 = 1;

// ── Value ────────────────────────────────────────────────────────────

/// A protocol-native typed value as carried in a varbind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Integer(i64),
    OctetString(Vec<u8>),
    Null,
    ObjectId(Oid),
    IpAddress(Ipv4Addr),
    Counter32(u32),
    Gauge32(u32),
    /// Hundredths of a second.
    TimeTicks(u32),
    Opaque(Vec<u8>),
    Counter64(u64),
    NoSuchObject,
    NoSuchInstance,
    EndOfMibView,
    /// Any tag this codec does not model; kept so decoding never fails on it.
    Other { tag: u8, data: Vec<u8> },
}

impl Value {
    /// `true` for the v2c "no value here" markers.
    pub fn is_exception(&self) -> bool {
        matches!(
            self,
            Self::NoSuchObject | Self::NoSuchInstance | Self::EndOfMibView
        )
    }

    fn encode(&self, buf: &mut BytesMut) -> Result<(), Error> {
        match self {
            Self::Integer(v) => ber::put_tlv(buf, tag::INTEGER, &ber::integer_content(*v)),
            Self::OctetString(data) => ber::put_tlv(buf, tag::OCTET_STRING, data),
            Self::Null => ber::put_tlv(buf, tag::NULL, &[]),
            Self::ObjectId(oid) => {
                ber::put_tlv(buf, tag::OBJECT_IDENTIFIER, &ber::oid_content(oid)?);
            }
            Self::IpAddress(addr) => ber::put_tlv(buf, tag::IP_ADDRESS, &addr.octets()),
            Self::Counter32(v) => {
                ber::put_tlv(buf, tag::COUNTER32, &ber::unsigned_content(u64::from(*v)));
            }
            Self::Gauge32(v) => {
                ber::put_tlv(buf, tag::GAUGE32, &ber::unsigned_content(u64::from(*v)));
            }
            Self::TimeTicks(v) => {
                ber::put_tlv(buf, tag::TIME_TICKS, &ber::unsigned_content(u64::from(*v)));
            }
            Self::Opaque(data) => ber::put_tlv(buf, tag::OPAQUE, data),
            Self::Counter64(v) => ber::put_tlv(buf, tag::COUNTER64, &ber::unsigned_content(*v)),
            Self::NoSuchObject => ber::put_tlv(buf, tag::NO_SUCH_OBJECT, &[]),
            Self::NoSuchInstance => ber::put_tlv(buf, tag::NO_SUCH_INSTANCE, &[]),
            Self::EndOfMibView => ber::put_tlv(buf, tag::END_OF_MIB_VIEW, &[]),
            Self::Other { tag, data } => ber::put_tlv(buf, *tag, data),
        }
        Ok(())
    }

    fn decode(tag_byte: u8, content: &[u8]) -> Result<Self, Error> {
        let value = match tag_byte {
            tag::INTEGER => Self::Integer(ber::decode_integer(content)?),
            tag::OCTET_STRING => Self::OctetString(content.to_vec()),
            tag::NULL => Self::Null,
            tag::OBJECT_IDENTIFIER => Self::ObjectId(ber::decode_oid(content)?),
            tag::IP_ADDRESS => {
                let octets: [u8; 4] = content
                    .try_into()
                    .map_err(|_| Error::Decode(format!("IpAddress of {} octets", content.len())))?;
                Self::IpAddress(Ipv4Addr::from(octets))
            }
            tag::COUNTER32 => Self::Counter32(narrow(ber::decode_unsigned(content)?)?),
            tag::GAUGE32 => Self::Gauge32(narrow(ber::decode_unsigned(content)?)?),
            tag::TIME_TICKS => Self::TimeTicks(narrow(ber::decode_unsigned(content)?)?),
            tag::OPAQUE => Self::Opaque(content.to_vec()),
            tag::COUNTER64 => Self::Counter64(ber::decode_unsigned(content)?),
            tag::NO_SUCH_OBJECT => Self::NoSuchObject,
            tag::NO_SUCH_INSTANCE => Self::NoSuchInstance,
            tag::END_OF_MIB_VIEW => Self::EndOfMibView,
            other => Self::Other {
                tag: other,
                data: content.to_vec(),
            },
        };
        Ok(value)
    }
}

fn narrow(v: u64) -> Result<u32, Error> {
    u32::try_from(v).map_err(|_| Error::Decode(format!("32-bit value out of range: {v}")))
}

/// One (identifier, value) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarBind {
    pub oid: Oid,
    pub value: Value,
}

impl VarBind {
    pub fn new(oid: Oid, value: Value) -> Self {
        Self { oid, value }
    }

    /// A request varbind: identifier with a NULL placeholder.
    pub fn null(oid: Oid) -> Self {
        Self {
            oid,
            value: Value::Null,
        }
    }
}

// ── PDU ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PduType {
    GetRequest,
    GetNextRequest,
    Response,
}

impl PduType {
    fn tag(self) -> u8 {
        match self {
            Self::GetRequest => tag::GET_REQUEST,
            Self::GetNextRequest => tag::GET_NEXT_REQUEST,
            Self::Response => tag::RESPONSE,
        }
    }

    fn from_tag(t: u8) -> Result<Self, Error> {
        match t {
            tag::GET_REQUEST => Ok(Self::GetRequest),
            tag::GET_NEXT_REQUEST => Ok(Self::GetNextRequest),
            tag::RESPONSE => Ok(Self::Response),
            other => Err(Error::Decode(format!("unsupported PDU type 0x{other:02x}"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pdu {
    pub kind: PduType,
    pub request_id: i32,
    pub error_status: i64,
    pub error_index: i64,
    pub varbinds: Vec<VarBind>,
}

impl Pdu {
    /// A GET or GET-NEXT request for the given identifiers.
    pub fn request(kind: PduType, request_id: i32, oids: &[Oid]) -> Self {
        Self {
            kind,
            request_id,
            error_status: 0,
            error_index: 0,
            varbinds: oids.iter().cloned().map(VarBind::null).collect(),
        }
    }

    /// A successful response carrying `varbinds`.
    pub fn response(request_id: i32, varbinds: Vec<VarBind>) -> Self {
        Self {
            kind: PduType::Response,
            request_id,
            error_status: 0,
            error_index: 0,
            varbinds,
        }
    }
}

// ── Message ──────────────────────────────────────────────────────────

/// A complete v2c datagram.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub community: Vec<u8>,
    pub pdu: Pdu,
}

impl Message {
    pub fn new(community: impl Into<Vec<u8>>, pdu: Pdu) -> Self {
        Self {
            community: community.into(),
            pdu,
        }
    }

    pub fn encode(&self) -> Result<Bytes, Error> {
        let mut bindings = BytesMut::new();
        for vb in &self.pdu.varbinds {
            let mut pair = BytesMut::new();
            ber::put_tlv(
                &mut pair,
                tag::OBJECT_IDENTIFIER,
                &ber::oid_content(&vb.oid)?,
            );
            vb.value.encode(&mut pair)?;
            ber::put_tlv(&mut bindings, tag::SEQUENCE, &pair);
        }

        let mut pdu = BytesMut::new();
        ber::put_tlv(
            &mut pdu,
            tag::INTEGER,
            &ber::integer_content(i64::from(self.pdu.request_id)),
        );
        ber::put_tlv(&mut pdu, tag::INTEGER, &ber::integer_content(self.pdu.error_status));
        ber::put_tlv(&mut pdu, tag::INTEGER, &ber::integer_content(self.pdu.error_index));
        ber::put_tlv(&mut pdu, tag::SEQUENCE, &bindings);

        let mut body = BytesMut::new();
        ber::put_tlv(&mut body, tag::INTEGER, &ber::integer_content(VERSION_2C));
        ber::put_tlv(&mut body, tag::OCTET_STRING, &self.community);
        ber::put_tlv(&mut body, self.pdu.kind.tag(), &pdu);

        let mut out = BytesMut::with_capacity(body.len() + 4);
        ber::put_tlv(&mut out, tag::SEQUENCE, &body);
        Ok(out.freeze())
    }

    pub fn decode(datagram: &[u8]) -> Result<Self, Error> {
        let mut outer = Reader::new(datagram);
        let mut body = Reader::new(outer.expect(tag::SEQUENCE)?);

        let version = body.integer()?;
        if version != VERSION_2C {
            return Err(Error::Decode(format!("unsupported SNMP version {version}")));
        }
        let community = body.expect(tag::OCTET_STRING)?.to_vec();

        let (pdu_tag, pdu_content) = body.read_tlv()?;
        let kind = PduType::from_tag(pdu_tag)?;
        let mut pdu = Reader::new(pdu_content);
        let request_id = i32::try_from(pdu.integer()?)
            .map_err(|_| Error::Decode("request-id out of range".into()))?;
        let error_status = pdu.integer()?;
        let error_index = pdu.integer()?;

        let mut list = Reader::new(pdu.expect(tag::SEQUENCE)?);
        let mut varbinds = Vec::new();
        while !list.is_empty() {
            let mut pair = Reader::new(list.expect(tag::SEQUENCE)?);
            let oid = ber::decode_oid(pair.expect(tag::OBJECT_IDENTIFIER)?)?;
            let (value_tag, value_content) = pair.read_tlv()?;
            varbinds.push(VarBind::new(oid, Value::decode(value_tag, value_content)?));
        }

        Ok(Self {
            community,
            pdu: Pdu {
                kind,
                request_id,
                error_status,
                error_index,
                varbinds,
            },
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn oid(s: &str) -> Oid {
        s.parse().unwrap()
    }

    #[test]
    fn get_request_matches_reference_encoding() {
        // snmpget -v2c -c public <host> 1.3.6.1.2.1.1.1.0 with request-id 1
        let msg = Message::new(
            b"public".to_vec(),
            Pdu::request(PduType::GetRequest, 1, &[oid("1.3.6.1.2.1.1.1.0")]),
        );
        let expected: &[u8] = &[
            0x30, 0x26, 0x02, 0x01, 0x01, 0x04, 0x06, b'p', b'u', b'b', b'l', b'i', b'c', 0xA0,
            0x19, 0x02, 0x01, 0x01, 0x02, 0x01, 0x00, 0x02, 0x01, 0x00, 0x30, 0x0E, 0x30, 0x0C,
            0x06, 0x08, 0x2B, 0x06, 0x01, 0x02, 0x01, 0x01, 0x01, 0x00, 0x05, 0x00,
        ];
        assert_eq!(msg.encode().unwrap().as_ref(), expected);
    }

    #[test]
    fn response_with_mixed_types_decodes() {
        let varbinds = vec![
            VarBind::new(
                oid("1.3.6.1.2.1.1.1.0"),
                Value::OctetString(b"Linux core-sw".to_vec()),
            ),
            VarBind::new(oid("1.3.6.1.2.1.1.3.0"), Value::TimeTicks(8_640_000)),
            VarBind::new(oid("1.3.6.1.2.1.2.2.1.10.1"), Value::Counter32(u32::MAX)),
            VarBind::new(oid("1.3.6.1.2.1.31.1.1.1.6.1"), Value::Counter64(1 << 40)),
            VarBind::new(oid("1.3.6.1.2.1.4.20.1.1.1"), Value::IpAddress(Ipv4Addr::new(10, 0, 0, 5))),
            VarBind::new(oid("1.3.6.1.2.1.1.9.0"), Value::NoSuchObject),
        ];
        let msg = Message::new(b"s3cret".to_vec(), Pdu::response(-7, varbinds.clone()));

        let decoded = Message::decode(&msg.encode().unwrap()).unwrap();
        assert_eq!(decoded.community, b"s3cret".to_vec());
        assert_eq!(decoded.pdu.kind, PduType::Response);
        assert_eq!(decoded.pdu.request_id, -7);
        assert_eq!(decoded.pdu.varbinds, varbinds);
    }

    #[test]
    fn rejects_v1_messages() {
        // version 0 = SNMPv1
        let datagram: &[u8] = &[
            0x30, 0x0D, 0x02, 0x01, 0x00, 0x04, 0x00, 0xA2, 0x06, 0x02, 0x01, 0x01, 0x02, 0x01,
            0x00,
        ];
        assert!(matches!(Message::decode(datagram), Err(Error::Decode(_))));
    }

    #[test]
    fn unknown_value_tags_are_preserved() {
        let vb = VarBind::new(
            oid("1.3.6.1.4.1.9.1"),
            Value::Other {
                tag: 0x47,
                data: vec![1, 2, 3],
            },
        );
        let msg = Message::new(b"public".to_vec(), Pdu::response(3, vec![vb.clone()]));
        let decoded = Message::decode(&msg.encode().unwrap()).unwrap();
        assert_eq!(decoded.pdu.varbinds, vec![vb]);
    }
}
