// ── Identifier catalog ──
//
// Standard MIB-II / HOST-RESOURCES / IF-MIB identifiers plus the vendor
// tables we read. Scalars carry their `.0` instance suffix; table columns
// do not and are parameterized with `column(col, index)`.

use super::oid::Oid;

/// Build an `Oid` from a catalog path.
pub fn oid(path: &[u32]) -> Oid {
    Oid::from(path)
}

/// Address one cell of a table column.
pub fn column(col: &[u32], index: u32) -> Oid {
    oid(col).child(index)
}

// ── SNMPv2-MIB system group ──────────────────────────────────────────

pub const SYS_DESCR: &[u32] = &[1, 3, 6, 1, 2, 1, 1, 1, 0];
pub const SYS_OBJECT_ID: &[u32] = &[1, 3, 6, 1, 2, 1, 1, 2, 0];
pub const SYS_UPTIME: &[u32] = &[1, 3, 6, 1, 2, 1, 1, 3, 0];
pub const SYS_CONTACT: &[u32] = &[1, 3, 6, 1, 2, 1, 1, 4, 0];
pub const SYS_NAME: &[u32] = &[1, 3, 6, 1, 2, 1, 1, 5, 0];
pub const SYS_LOCATION: &[u32] = &[1, 3, 6, 1, 2, 1, 1, 6, 0];
pub const SYS_SERVICES: &[u32] = &[1, 3, 6, 1, 2, 1, 1, 7, 0];

// ── IF-MIB interfaces ────────────────────────────────────────────────

pub const IF_NUMBER: &[u32] = &[1, 3, 6, 1, 2, 1, 2, 1, 0];
pub const IF_DESCR: &[u32] = &[1, 3, 6, 1, 2, 1, 2, 2, 1, 2];
pub const IF_TYPE: &[u32] = &[1, 3, 6, 1, 2, 1, 2, 2, 1, 3];
pub const IF_SPEED: &[u32] = &[1, 3, 6, 1, 2, 1, 2, 2, 1, 5];
pub const IF_ADMIN_STATUS: &[u32] = &[1, 3, 6, 1, 2, 1, 2, 2, 1, 7];
pub const IF_OPER_STATUS: &[u32] = &[1, 3, 6, 1, 2, 1, 2, 2, 1, 8];
pub const IF_IN_OCTETS: &[u32] = &[1, 3, 6, 1, 2, 1, 2, 2, 1, 10];
pub const IF_IN_ERRORS: &[u32] = &[1, 3, 6, 1, 2, 1, 2, 2, 1, 14];
pub const IF_OUT_OCTETS: &[u32] = &[1, 3, 6, 1, 2, 1, 2, 2, 1, 16];
pub const IF_OUT_ERRORS: &[u32] = &[1, 3, 6, 1, 2, 1, 2, 2, 1, 20];

/// 64-bit counters from ifXTable.
pub const IF_HC_IN_OCTETS: &[u32] = &[1, 3, 6, 1, 2, 1, 31, 1, 1, 1, 6];
pub const IF_HC_OUT_OCTETS: &[u32] = &[1, 3, 6, 1, 2, 1, 31, 1, 1, 1, 10];

// ── HOST-RESOURCES-MIB ───────────────────────────────────────────────

pub const HR_PROCESSOR_LOAD: &[u32] = &[1, 3, 6, 1, 2, 1, 25, 3, 3, 1, 2];
pub const HR_STORAGE_DESCR: &[u32] = &[1, 3, 6, 1, 2, 1, 25, 2, 3, 1, 3];
pub const HR_STORAGE_ALLOCATION_UNITS: &[u32] = &[1, 3, 6, 1, 2, 1, 25, 2, 3, 1, 4];
pub const HR_STORAGE_SIZE: &[u32] = &[1, 3, 6, 1, 2, 1, 25, 2, 3, 1, 5];
pub const HR_STORAGE_USED: &[u32] = &[1, 3, 6, 1, 2, 1, 25, 2, 3, 1, 6];

// ── IP-MIB ───────────────────────────────────────────────────────────

pub const IP_FORWARDING: &[u32] = &[1, 3, 6, 1, 2, 1, 4, 1, 0];
pub const IP_IN_RECEIVES: &[u32] = &[1, 3, 6, 1, 2, 1, 4, 3, 0];
pub const IP_OUT_REQUESTS: &[u32] = &[1, 3, 6, 1, 2, 1, 4, 10, 0];

// ── Cisco private MIBs ───────────────────────────────────────────────

pub const CISCO_CPU_TOTAL_5MIN: &[u32] = &[1, 3, 6, 1, 4, 1, 9, 9, 109, 1, 1, 1, 1, 5];
pub const CISCO_MEMORY_POOL_USED: &[u32] = &[1, 3, 6, 1, 4, 1, 9, 9, 48, 1, 1, 1, 5];
pub const CISCO_MEMORY_POOL_FREE: &[u32] = &[1, 3, 6, 1, 4, 1, 9, 9, 48, 1, 1, 1, 6];

// ── Enterprise numbers ───────────────────────────────────────────────

/// `iso.org.dod.internet.private.enterprises`
pub const ENTERPRISES: &[u32] = &[1, 3, 6, 1, 4, 1];

/// IANA private enterprise numbers for vendors we recognize.
pub const ENTERPRISE_IDS: &[(&str, u32)] = &[
    ("cisco", 9),
    ("hp", 11),
    ("microsoft", 311),
    ("juniper", 2636),
    ("dell", 674),
    ("netgear", 4526),
    ("ubiquiti", 41112),
    ("fortinet", 12356),
    ("paloalto", 25461),
];

/// Map a `sysObjectID` value to a known vendor name.
pub fn vendor_for(sys_object_id: &Oid) -> Option<&'static str> {
    let c = sys_object_id.components();
    if !c.starts_with(ENTERPRISES) {
        return None;
    }
    let number = *c.get(ENTERPRISES.len())?;
    ENTERPRISE_IDS
        .iter()
        .find(|(_, id)| *id == number)
        .map(|(name, _)| *name)
}
