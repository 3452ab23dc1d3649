//! Rendering of PDU values.
//!
//! Two views of a value are needed when building samples:
//!
//! - [`as_float`] gives the numeric sample value;
//! - [`as_string`] gives the text used for labels, filters and regex
//!   extraction. Octet strings are rendered through the index decoder so an
//!   octet string reads the same whether it appears in an OID index or as a
//!   value.
//!
//! ```
//! use snmp_exporter::config::IndexType;
//! use snmp_exporter::format::{self, as_float};
//! use snmp_exporter::{Metrics, Value};
//!
//! assert_eq!(as_float(&Value::Counter64(19007199254740992), true), 992800745259008.0);
//!
//! let metrics = Metrics::unregistered().unwrap();
//! let mac = Value::from(vec![0x00, 0x1a, 0x2b, 0x3c, 0x4d, 0x5e]);
//! assert_eq!(format::as_string(&mac, Some(IndexType::PhysAddress48), &[], &metrics), "00:1A:2B:3C:4D:5E");
//! assert_eq!(format::as_string(&mac, None, &[], &metrics), "0x001A2B3C4D5E");
//! ```

pub mod display_hint;
pub mod hex;
pub mod time;

use crate::config::IndexType;
use crate::index::{self, Layout};
use crate::metrics::Metrics;
use crate::value::Value;
use display_hint::FormatOp;

/// 2^53: the largest power of two below which every integer is exact in an f64.
pub const FLOAT64_MANTISSA: u64 = 1 << 53;

/// Replace each run of invalid UTF-8 with a single U+FFFD.
///
/// ```
/// use snmp_exporter::format::sanitize_utf8;
///
/// assert_eq!(sanitize_utf8(b"sane\xfd\xbe\xd6"), "sane\u{FFFD}");
/// assert_eq!(sanitize_utf8(b"a\x80b\x80"), "a\u{FFFD}b\u{FFFD}");
/// ```
pub fn sanitize_utf8(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    let mut rest = bytes;
    let mut in_invalid_run = false;

    loop {
        match std::str::from_utf8(rest) {
            Ok(valid) => {
                out.push_str(valid);
                return out;
            }
            Err(e) => {
                let (valid, after) = rest.split_at(e.valid_up_to());
                if !valid.is_empty() {
                    // The prefix was just validated.
                    out.push_str(std::str::from_utf8(valid).unwrap_or_default());
                    in_invalid_run = false;
                }
                if !in_invalid_run {
                    out.push(char::REPLACEMENT_CHARACTER);
                    in_invalid_run = true;
                }
                match e.error_len() {
                    Some(len) => rest = &after[len..],
                    None => return out,
                }
            }
        }
    }
}

/// Numeric value of a PDU.
///
/// `Counter64` is reduced modulo 2^53 when `wrap_counters` is set so that
/// it survives conversion to f64 without rounding. Non-numeric values are 0.
///
/// ```
/// use snmp_exporter::format::as_float;
/// use snmp_exporter::Value;
///
/// assert_eq!(as_float(&Value::Integer(-2), true), -2.0);
/// assert_eq!(as_float(&Value::OpaqueFloat(10.5), true), 10.5);
/// assert_eq!(as_float(&Value::Text("x".into()), true), 0.0);
/// ```
pub fn as_float(value: &Value, wrap_counters: bool) -> f64 {
    match value {
        Value::Counter64(v) => {
            if wrap_counters {
                (v % FLOAT64_MANTISSA) as f64
            } else {
                *v as f64
            }
        }
        Value::OpaqueFloat(v) => f64::from(*v),
        Value::OpaqueDouble(v) => *v,
        Value::Integer(v) => f64::from(*v),
        Value::Counter32(v) | Value::Gauge32(v) | Value::TimeTicks(v) => f64::from(*v),
        _ => 0.0,
    }
}

/// Text form of a PDU value.
///
/// `index_type` selects how octet strings are decoded; `None` renders them
/// as `0x` hex. Numeric values are printed in decimal, OIDs in dotted form,
/// and absent values (`Null`, exceptions) as the empty string. Value kinds
/// the formatter does not know about bump `snmp_unexpected_pdu_type_total`
/// and are rendered as lossy text.
pub fn as_string(
    value: &Value,
    index_type: Option<IndexType>,
    format_spec: &[FormatOp],
    metrics: &Metrics,
) -> String {
    match value {
        Value::Integer(v) => v.to_string(),
        Value::Counter32(v) | Value::Gauge32(v) | Value::TimeTicks(v) => v.to_string(),
        Value::Counter64(v) => v.to_string(),
        Value::OpaqueFloat(v) => v.to_string(),
        Value::OpaqueDouble(v) => v.to_string(),
        Value::ObjectIdentifier(oid) => oid.to_string(),
        Value::Text(s) => s.clone(),
        Value::IpAddress(a) => format!("{}.{}.{}.{}", a[0], a[1], a[2], a[3]),
        Value::OctetString(data) | Value::Opaque(data) => {
            bytes_as_string(data, index_type.unwrap_or(IndexType::OctetString), format_spec)
        }
        Value::Null | Value::NoSuchObject | Value::NoSuchInstance | Value::EndOfMibView => {
            String::new()
        }
        Value::Unknown { tag, data } => {
            metrics.unexpected_pdu_type.inc();
            tracing::debug!(target: "snmp_exporter::format", { tag = *tag, data = %hex::Bytes(data) }, "unexpected PDU value type");
            sanitize_utf8(data)
        }
    }
}

/// Decode bytes as if they were index sub-identifiers of `index_type`.
fn bytes_as_string(data: &[u8], index_type: IndexType, format_spec: &[FormatOp]) -> String {
    let mut arcs: Vec<u32> = Vec::with_capacity(data.len() + 1);
    // The length is explicit in an index, so sized types get it prepended.
    if index_type.is_sized() {
        arcs.push(data.len() as u32);
    }
    arcs.extend(data.iter().map(|&b| u32::from(b)));

    let layout = Layout::new(index_type).with_format(format_spec);
    index::decode(&arcs, &layout).text
}
