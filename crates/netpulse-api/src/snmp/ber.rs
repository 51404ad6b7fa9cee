// ── BER primitives ──
//
// The subset of X.690 Basic Encoding Rules that SNMP v2c needs:
// definite lengths, primitive INTEGER / OCTET STRING / NULL / OID,
// and constructed SEQUENCE-like containers.

use bytes::{BufMut, BytesMut};

use super::oid::Oid;
use crate::error::Error;

// ── Tags ─────────────────────────────────────────────────────────────

pub(crate) mod tag {
    pub const INTEGER: u8 = 0x02;
    pub const OCTET_STRING: u8 = 0x04;
    pub const NULL: u8 = 0x05;
    pub const OBJECT_IDENTIFIER: u8 = 0x06;
    pub const SEQUENCE: u8 = 0x30;

    // SNMPv2-SMI application types
    pub const IP_ADDRESS: u8 = 0x40;
    pub const COUNTER32: u8 = 0x41;
    pub const GAUGE32: u8 = 0x42;
    pub const TIME_TICKS: u8 = 0x43;
    pub const OPAQUE: u8 = 0x44;
    pub const COUNTER64: u8 = 0x46;

    // Varbind exception values (context-specific, primitive)
    pub const NO_SUCH_OBJECT: u8 = 0x80;
    pub const NO_SUCH_INSTANCE: u8 = 0x81;
    pub const END_OF_MIB_VIEW: u8 = 0x82;

    // PDU types (context-specific, constructed)
    pub const GET_REQUEST: u8 = 0xA0;
    pub const GET_NEXT_REQUEST: u8 = 0xA1;
    pub const RESPONSE: u8 = 0xA2;
}

// ── Encoding ─────────────────────────────────────────────────────────

/// Write a tag-length-value triple.
pub(crate) fn put_tlv(buf: &mut BytesMut, tag: u8, content: &[u8]) {
    buf.put_u8(tag);
    put_length(buf, content.len());
    buf.put_slice(content);
}

fn put_length(buf: &mut BytesMut, len: usize) {
    if len < 0x80 {
        #[allow(clippy::cast_possible_truncation, clippy::as_conversions)]
        buf.put_u8(len as u8);
        return;
    }
    let bytes = len.to_be_bytes();
    let skip = bytes.iter().take_while(|b| **b == 0).count();
    let significant = &bytes[skip..];
    #[allow(clippy::cast_possible_truncation, clippy::as_conversions)]
    buf.put_u8(0x80 | significant.len() as u8);
    buf.put_slice(significant);
}

/// Minimal two's-complement content octets for a signed integer.
pub(crate) fn integer_content(value: i64) -> Vec<u8> {
    let bytes = value.to_be_bytes();
    let mut start = 0;
    while start < bytes.len() - 1 {
        let cur = bytes[start];
        let next_high = bytes[start + 1] & 0x80;
        if (cur == 0x00 && next_high == 0) || (cur == 0xFF && next_high != 0) {
            start += 1;
        } else {
            break;
        }
    }
    bytes[start..].to_vec()
}

/// Minimal content octets for an unsigned application type.
pub(crate) fn unsigned_content(value: u64) -> Vec<u8> {
    let bytes = value.to_be_bytes();
    let skip = bytes
        .iter()
        .take_while(|b| **b == 0)
        .count()
        .min(bytes.len() - 1);
    let mut out = Vec::with_capacity(9);
    if bytes[skip] & 0x80 != 0 {
        out.push(0);
    }
    out.extend_from_slice(&bytes[skip..]);
    out
}

pub(crate) fn oid_content(oid: &Oid) -> Result<Vec<u8>, Error> {
    let c = oid.components();
    let (first, second) = match c {
        [a, b, ..] if *a <= 2 && (*a == 2 || *b < 40) => (*a, *b),
        _ => return Err(Error::InvalidOid(oid.to_string())),
    };
    let mut out = Vec::with_capacity(c.len() + 4);
    put_base128(&mut out, first * 40 + second);
    for sub in &c[2..] {
        put_base128(&mut out, *sub);
    }
    Ok(out)
}

fn put_base128(out: &mut Vec<u8>, mut value: u32) {
    let mut groups = [0u8; 5];
    let mut n = 0;
    loop {
        #[allow(clippy::cast_possible_truncation, clippy::as_conversions)]
        let low = (value & 0x7F) as u8;
        groups[n] = low;
        n += 1;
        value >>= 7;
        if value == 0 {
            break;
        }
    }
    for i in (0..n).rev() {
        let cont = if i == 0 { 0 } else { 0x80 };
        out.push(groups[i] | cont);
    }
}

// ── Decoding ─────────────────────────────────────────────────────────

/// Cursor over a BER byte slice.
pub(crate) struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub(crate) fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.pos >= self.buf.len()
    }

    fn byte(&mut self) -> Result<u8, Error> {
        let b = self
            .buf
            .get(self.pos)
            .copied()
            .ok_or_else(|| Error::Decode("unexpected end of data".into()))?;
        self.pos += 1;
        Ok(b)
    }

    fn length(&mut self) -> Result<usize, Error> {
        let first = self.byte()?;
        if first & 0x80 == 0 {
            return Ok(usize::from(first));
        }
        let count = usize::from(first & 0x7F);
        if count == 0 || count > 4 {
            return Err(Error::Decode(format!("unsupported length form 0x{first:02x}")));
        }
        let mut len = 0usize;
        for _ in 0..count {
            len = (len << 8) | usize::from(self.byte()?);
        }
        Ok(len)
    }

    /// Read the next TLV, returning its tag and content slice.
    pub(crate) fn read_tlv(&mut self) -> Result<(u8, &'a [u8]), Error> {
        let tag = self.byte()?;
        let len = self.length()?;
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.buf.len())
            .ok_or_else(|| Error::Decode(format!("length {len} overruns buffer")))?;
        let content = &self.buf[self.pos..end];
        self.pos = end;
        Ok((tag, content))
    }

    /// Read a TLV and require a specific tag.
    pub(crate) fn expect(&mut self, expected: u8) -> Result<&'a [u8], Error> {
        let (tag, content) = self.read_tlv()?;
        if tag != expected {
            return Err(Error::Decode(format!(
                "expected tag 0x{expected:02x}, found 0x{tag:02x}"
            )));
        }
        Ok(content)
    }

    pub(crate) fn integer(&mut self) -> Result<i64, Error> {
        let content = self.expect(tag::INTEGER)?;
        decode_integer(content)
    }
}

pub(crate) fn decode_integer(content: &[u8]) -> Result<i64, Error> {
    if content.is_empty() || content.len() > 8 {
        return Err(Error::Decode(format!(
            "integer of {} octets",
            content.len()
        )));
    }
    let negative = content[0] & 0x80 != 0;
    let mut value: i64 = if negative { -1 } else { 0 };
    for b in content {
        value = (value << 8) | i64::from(*b);
    }
    Ok(value)
}

pub(crate) fn decode_unsigned(content: &[u8]) -> Result<u64, Error> {
    let trimmed = match content {
        [0, rest @ ..] if !rest.is_empty() => rest,
        other => other,
    };
    if trimmed.is_empty() || trimmed.len() > 8 {
        return Err(Error::Decode(format!(
            "unsigned of {} octets",
            content.len()
        )));
    }
    Ok(trimmed.iter().fold(0u64, |acc, b| (acc << 8) | u64::from(*b)))
}

pub(crate) fn decode_oid(content: &[u8]) -> Result<Oid, Error> {
    let mut subs = Vec::with_capacity(content.len() + 1);
    let mut acc: u32 = 0;
    let mut in_progress = false;
    for b in content {
        if acc > (u32::MAX >> 7) {
            return Err(Error::Decode("object identifier component overflow".into()));
        }
        acc = (acc << 7) | u32::from(b & 0x7F);
        in_progress = true;
        if b & 0x80 == 0 {
            if subs.is_empty() {
                let (first, second) = match acc {
                    0..40 => (0, acc),
                    40..80 => (1, acc - 40),
                    _ => (2, acc - 80),
                };
                subs.push(first);
                subs.push(second);
            } else {
                subs.push(acc);
            }
            acc = 0;
            in_progress = false;
        }
    }
    if in_progress || subs.is_empty() {
        return Err(Error::Decode("truncated object identifier".into()));
    }
    Ok(Oid::new(subs))
}
