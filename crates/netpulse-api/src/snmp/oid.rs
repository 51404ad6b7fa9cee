// ── Object identifiers ──
//
// Hierarchical numeric paths naming a manageable value on a device.

use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// An SNMP object identifier, e.g. `1.3.6.1.2.1.1.1.0`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Oid(Vec<u32>);

impl Oid {
    pub fn new(components: Vec<u32>) -> Self {
        Self(components)
    }

    pub fn components(&self) -> &[u32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Last component, which is the row index for table columns.
    pub fn last(&self) -> Option<u32> {
        self.0.last().copied()
    }

    /// Append a table index to a column identifier.
    pub fn child(&self, index: u32) -> Self {
        let mut components = self.0.clone();
        components.push(index);
        Self(components)
    }

    /// Component-wise prefix test: `…2.2.1.10.1` is under `…2.2.1.10`,
    /// but `…2.2.1.20` is not under `…2.2.1.2`.
    pub fn starts_with(&self, base: &Oid) -> bool {
        self.0.starts_with(&base.0)
    }
}

impl fmt::Display for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, c) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{c}")?;
        }
        Ok(())
    }
}

impl FromStr for Oid {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().trim_start_matches('.');
        if trimmed.is_empty() {
            return Err(Error::InvalidOid(s.to_owned()));
        }
        let components = trimmed
            .split('.')
            .map(str::parse::<u32>)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| Error::InvalidOid(s.to_owned()))?;
        if components.len() < 2 {
            return Err(Error::InvalidOid(s.to_owned()));
        }
        Ok(Self(components))
    }
}

impl From<&[u32]> for Oid {
    fn from(components: &[u32]) -> Self {
        Self(components.to_vec())
    }
}
