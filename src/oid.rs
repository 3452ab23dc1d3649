//! Object identifiers.
//!
//! Every PDU name, walk root and metric base is an [`Oid`]. Column OIDs plus
//! a short index fit in the inline buffer; long string indexes spill to the
//! heap.

use crate::error::{Error, Result};
use smallvec::SmallVec;
use std::fmt;

/// A sequence of sub-identifiers, ordered arc by arc.
///
/// ```
/// use snmp_exporter::{Oid, oid};
///
/// let name: Oid = ".1.3.6.1.2.1.2.2.1.2.7".parse().unwrap();
/// assert_eq!(name, oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 2, 7));
/// assert_eq!(name.to_string(), "1.3.6.1.2.1.2.2.1.2.7");
/// ```
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Oid(SmallVec<[u32; 16]>);

impl Oid {
    #[doc(hidden)]
    pub fn from_slice(arcs: &[u32]) -> Self {
        Self(SmallVec::from_slice(arcs))
    }

    /// Parse dotted notation.
    ///
    /// One leading `.` is accepted since agents commonly report names that
    /// way. Empty or non-numeric sub-identifiers are rejected; the empty
    /// string is the empty OID.
    ///
    /// ```
    /// use snmp_exporter::Oid;
    ///
    /// assert!(Oid::parse("1..3").is_err());
    /// assert!(Oid::parse("1.3.x").is_err());
    /// assert!(Oid::parse("").unwrap().is_empty());
    /// ```
    pub fn parse(s: &str) -> Result<Self> {
        let body = s.strip_prefix('.').unwrap_or(s);
        if body.is_empty() {
            return Ok(Self::default());
        }
        body.split('.')
            .map(|part| part.parse::<u32>())
            .collect::<std::result::Result<SmallVec<_>, _>>()
            .map(Self)
            .map_err(|_| Error::InvalidOid { input: s.into() }.boxed())
    }

    pub fn arcs(&self) -> &[u32] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether `prefix` covers this OID. Comparison is per arc, so
    /// `1.3.6.1.2.1.2.2.1.21` is not under `1.3.6.1.2.1.2.2.1.2`.
    pub fn starts_with(&self, prefix: &Oid) -> bool {
        self.0.starts_with(&prefix.0)
    }

    pub fn child(&self, arc: u32) -> Oid {
        self.with_suffix(&[arc])
    }

    /// This OID with `suffix` appended, e.g. a column plus an instance index.
    pub fn with_suffix(&self, suffix: &[u32]) -> Oid {
        let mut arcs = self.0.clone();
        arcs.extend_from_slice(suffix);
        Oid(arcs)
    }

    /// The column before this one in the same table entry.
    ///
    /// Discriminated `InetAddress` and `LldpPortId` columns read their type
    /// from here. A last arc of 0 stays 0.
    ///
    /// ```
    /// use snmp_exporter::oid;
    ///
    /// assert_eq!(oid!(1, 3, 6, 1, 2, 1, 4, 20, 1, 3).prev_sibling(), oid!(1, 3, 6, 1, 2, 1, 4, 20, 1, 2));
    /// ```
    pub fn prev_sibling(&self) -> Oid {
        let mut arcs = self.0.clone();
        if let Some(last) = arcs.last_mut() {
            *last = last.saturating_sub(1);
        }
        Oid(arcs)
    }

    pub fn last(&self) -> Option<u32> {
        self.0.last().copied()
    }
}

impl fmt::Debug for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Oid({self})")
    }
}

impl fmt::Display for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut arcs = self.0.iter();
        if let Some(first) = arcs.next() {
            write!(f, "{first}")?;
        }
        for arc in arcs {
            write!(f, ".{arc}")?;
        }
        Ok(())
    }
}

impl std::str::FromStr for Oid {
    type Err = Box<Error>;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl serde::Serialize for Oid {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for Oid {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Oid::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Build an [`Oid`] from literal arcs.
///
/// ```
/// use snmp_exporter::oid;
///
/// assert_eq!(oid!(1, 3, 6, 1, 2, 1, 1, 3, 0).to_string(), "1.3.6.1.2.1.1.3.0");
/// ```
#[macro_export]
macro_rules! oid {
    ($($arc:expr),* $(,)?) => {
        $crate::oid::Oid::from_slice(&[$($arc),*])
    };
}
