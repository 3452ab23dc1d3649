//! SNMP value types.
//!
//! The `Value` enum represents every value a scraper can hand back,
//! including the v2c exception sentinels. The SNMP type tag of a PDU is the
//! variant itself.

use crate::oid::Oid;
use bytes::Bytes;

/// A PDU value as handed back by a scraper.
///
/// Numeric variants become sample values directly; octet strings are decoded
/// into label text according to the metric or index type.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Value {
    Integer(i32),
    OctetString(Bytes),
    /// String the scraper already decoded; rendered verbatim.
    Text(String),
    Null,
    ObjectIdentifier(Oid),
    IpAddress([u8; 4]),
    Counter32(u32),
    Gauge32(u32),
    /// Hundredths of a second, reported as the raw tick count.
    TimeTicks(u32),
    Opaque(Bytes),
    /// Subject to wrapping at 2^53 when counters are wrapped.
    Counter64(u64),
    /// net-snmp float carried inside an Opaque.
    OpaqueFloat(f32),
    OpaqueDouble(f64),
    NoSuchObject,
    NoSuchInstance,
    EndOfMibView,
    /// A tag this crate does not know; rendered as hex.
    Unknown { tag: u8, data: Bytes },
}

impl Value {
    /// Raw bytes of `OctetString` and `Opaque` values.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::OctetString(data) | Value::Opaque(data) => Some(data),
            _ => None,
        }
    }

    /// Integer view used for discriminators and chained lookups.
    ///
    /// Integer-like variants yield their value; everything else yields 0.
    ///
    /// ```
    /// use snmp_exporter::Value;
    ///
    /// assert_eq!(Value::Integer(-3).as_index_int(), -3);
    /// assert_eq!(Value::Gauge32(42).as_index_int(), 42);
    /// assert_eq!(Value::Text("eth0".into()).as_index_int(), 0);
    /// ```
    pub fn as_index_int(&self) -> i64 {
        match self {
            Value::Integer(v) => i64::from(*v),
            Value::Counter32(v) | Value::Gauge32(v) | Value::TimeTicks(v) => i64::from(*v),
            Value::Counter64(v) => *v as i64,
            Value::OpaqueFloat(v) => *v as i64,
            Value::OpaqueDouble(v) => *v as i64,
            _ => 0,
        }
    }

    /// Short name of the SNMP type, for logs.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Integer(_) => "Integer",
            Value::OctetString(_) => "OctetString",
            Value::Text(_) => "OctetString",
            Value::Null => "Null",
            Value::ObjectIdentifier(_) => "ObjectIdentifier",
            Value::IpAddress(_) => "IPAddress",
            Value::Counter32(_) => "Counter32",
            Value::Gauge32(_) => "Gauge32",
            Value::TimeTicks(_) => "TimeTicks",
            Value::Opaque(_) => "Opaque",
            Value::Counter64(_) => "Counter64",
            Value::OpaqueFloat(_) => "OpaqueFloat",
            Value::OpaqueDouble(_) => "OpaqueDouble",
            Value::NoSuchObject => "NoSuchObject",
            Value::NoSuchInstance => "NoSuchInstance",
            Value::EndOfMibView => "EndOfMibView",
            Value::Unknown { .. } => "Unknown",
        }
    }
}

/// Shorthands used when building mock agents and fixtures.
///
/// ```
/// use snmp_exporter::Value;
///
/// let v: Value = 42i32.into();
/// assert_eq!(v, Value::Integer(42));
///
/// // Strings become already-decoded text
/// let v: Value = "eth0".into();
/// assert!(matches!(v, Value::Text(ref s) if s == "eth0"));
///
/// // Byte slices become octet strings
/// let v: Value = (&[1u8, 2, 3][..]).into();
/// assert_eq!(v.as_bytes(), Some(&[1, 2, 3][..]));
/// ```
impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<&[u8]> for Value {
    fn from(data: &[u8]) -> Self {
        Value::OctetString(Bytes::copy_from_slice(data))
    }
}

impl From<Vec<u8>> for Value {
    fn from(data: Vec<u8>) -> Self {
        Value::OctetString(Bytes::from(data))
    }
}

impl From<Bytes> for Value {
    fn from(data: Bytes) -> Self {
        Value::OctetString(data)
    }
}

impl From<Oid> for Value {
    fn from(oid: Oid) -> Self {
        Value::ObjectIdentifier(oid)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::Counter64(v)
    }
}

impl From<[u8; 4]> for Value {
    fn from(addr: [u8; 4]) -> Self {
        Value::IpAddress(addr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_int_for_chained_lookups() {
        assert_eq!(Value::Counter64(42).as_index_int(), 42);
        assert_eq!(Value::OpaqueDouble(7.9).as_index_int(), 7);
        assert_eq!(Value::OctetString(Bytes::from_static(b"42")).as_index_int(), 0);
        assert_eq!(Value::Null.as_index_int(), 0);
    }

    #[test]
    fn text_reports_octet_string_type() {
        assert_eq!(Value::from("eth0").type_name(), "OctetString");
        assert_eq!(Value::from([10, 0, 0, 1]).type_name(), "IPAddress");
        assert_eq!(Value::from(Bytes::from_static(b"x")).as_bytes(), Some(&b"x"[..]));
        assert_eq!(Value::from("x").as_bytes(), None);
    }
}
