//! Index decoding: turning the OID suffix after a metric's base into labels.
//!
//! A table row is identified by the sub-identifiers that follow the column
//! OID. Each declared [`Index`] consumes some of them according to its
//! type; what it consumed is kept so lookups can rebuild related OIDs.
//!
//! ```
//! use snmp_exporter::config::IndexType;
//! use snmp_exporter::index::{decode, Layout};
//!
//! let d = decode(&[192, 168, 1, 2, 7], &Layout::new(IndexType::InetAddressIPv4));
//! assert_eq!(d.text, "192.168.1.2");
//! assert_eq!(d.remaining, vec![7]);
//!
//! // Variable-length strings carry their size first.
//! let d = decode(&[2, 65, 32, 9], &Layout::new(IndexType::DisplayString));
//! assert_eq!(d.text, "A ");
//! assert_eq!(d.used, vec![2, 65, 32]);
//! assert_eq!(d.remaining, vec![9]);
//! ```

use crate::config::{EnumValues, Index, IndexType};
use crate::format::display_hint::{self, FormatOp};
use crate::format::{hex, sanitize_utf8};
use std::fmt::Write;

/// Padding added past the end of a short suffix is capped at the longest
/// OID an agent may send.
const MAX_PADDING: usize = 128;

static NO_ENUMS: EnumValues = EnumValues::new();

/// How to decode one index component.
#[derive(Debug, Clone, Copy)]
pub struct Layout<'a> {
    pub index_type: IndexType,
    /// Explicit length for sized types; 0 reads a size sub-identifier.
    pub fixed_size: usize,
    /// Consume everything that remains, without a size sub-identifier.
    pub implied: bool,
    pub enum_values: &'a EnumValues,
    pub format_spec: &'a [FormatOp],
}

impl<'a> Layout<'a> {
    pub fn new(index_type: IndexType) -> Self {
        Self {
            index_type,
            fixed_size: 0,
            implied: false,
            enum_values: &NO_ENUMS,
            format_spec: &[],
        }
    }

    pub fn with_format(mut self, format_spec: &'a [FormatOp]) -> Self {
        self.format_spec = format_spec;
        self
    }

    pub fn with_enums(mut self, enum_values: &'a EnumValues) -> Self {
        self.enum_values = enum_values;
        self
    }

    pub fn fixed(mut self, size: usize) -> Self {
        self.fixed_size = size;
        self
    }

    pub fn implied(mut self) -> Self {
        self.implied = true;
        self
    }

    fn retyped(&self, index_type: IndexType) -> Self {
        Self {
            index_type,
            fixed_size: 0,
            implied: false,
            ..*self
        }
    }
}

impl<'a> From<&'a Index> for Layout<'a> {
    fn from(index: &'a Index) -> Self {
        Self {
            index_type: index.index_type,
            fixed_size: index.fixed_size,
            implied: index.implied,
            enum_values: &index.enum_values,
            format_spec: &index.format_spec,
        }
    }
}

/// Result of decoding one index component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    /// Label value.
    pub text: String,
    /// Sub-identifiers this component consumed (zero-padded when the suffix was short).
    pub used: Vec<u32>,
    /// Sub-identifiers left for the next component.
    pub remaining: Vec<u32>,
}

/// Split `oids` after `count` elements, right-padding the head with zeros.
///
/// Some agents drop trailing zero sub-identifiers from their responses.
pub fn split_oid(oids: &[u32], count: usize) -> (Vec<u32>, Vec<u32>) {
    let count = count.min(oids.len() + MAX_PADDING);
    let mut head = vec![0u32; count];
    let n = oids.len().min(count);
    head[..n].copy_from_slice(&oids[..n]);
    let tail = oids.get(count..).unwrap_or_default().to_vec();
    (head, tail)
}

/// Decode one index component from the front of `oids`.
pub fn decode(oids: &[u32], layout: &Layout<'_>) -> Decoded {
    match layout.index_type {
        IndexType::Integer | IndexType::Integer32 | IndexType::Gauge | IndexType::Counter => {
            let (used, remaining) = split_oid(oids, 1);
            Decoded {
                text: used[0].to_string(),
                used,
                remaining,
            }
        }
        IndexType::PhysAddress48 => {
            let (used, remaining) = split_oid(oids, 6);
            let text = join_hex(&used, 1);
            Decoded {
                text,
                used,
                remaining,
            }
        }
        IndexType::OctetString | IndexType::DisplayString | IndexType::DisplayHint => {
            decode_sized(oids, layout)
        }
        IndexType::InetAddressIPv4 => {
            let (used, remaining) = split_oid(oids, 4);
            let text = used
                .iter()
                .map(u32::to_string)
                .collect::<Vec<_>>()
                .join(".");
            Decoded {
                text,
                used,
                remaining,
            }
        }
        IndexType::InetAddressIPv6 => {
            let (used, remaining) = split_oid(oids, 16);
            let text = join_hex(&used, 2);
            Decoded {
                text,
                used,
                remaining,
            }
        }
        IndexType::EnumAsInfo => {
            let (used, remaining) = split_oid(oids, 1);
            let text = layout
                .enum_values
                .get(&i64::from(used[0]))
                .cloned()
                .unwrap_or_else(|| used[0].to_string());
            Decoded {
                text,
                used,
                remaining,
            }
        }
        IndexType::InetAddress | IndexType::InetAddressMissingSize | IndexType::LldpPortId => {
            decode_discriminated(oids, layout)
        }
    }
}

/// Hex pairs, `group` sub-identifiers per `:`-separated group.
fn join_hex(arcs: &[u32], group: usize) -> String {
    let mut text = String::with_capacity(arcs.len() * 3);
    for (i, arc) in arcs.iter().enumerate() {
        if i > 0 && i % group == 0 {
            text.push(':');
        }
        let _ = write!(text, "{:02X}", arc);
    }
    text
}

fn decode_sized(oids: &[u32], layout: &Layout<'_>) -> Decoded {
    let mut length = if layout.implied {
        oids.len()
    } else {
        layout.fixed_size
    };

    let mut used = Vec::new();
    let mut rest = oids;
    let after_size;
    if length == 0 {
        let (head, tail) = split_oid(oids, 1);
        length = head[0] as usize;
        used = head;
        after_size = tail;
        rest = &after_size;
    }

    let (content, remaining) = split_oid(rest, length);
    let bytes: Vec<u8> = content.iter().map(|&o| o as u8).collect();
    used.extend_from_slice(&content);

    let text = match layout.index_type {
        IndexType::DisplayString => sanitize_utf8(&bytes),
        IndexType::DisplayHint => display_hint::apply(layout.format_spec, &bytes)
            .map(|raw| sanitize_utf8(&raw))
            .unwrap_or_else(|| octet_string(&bytes)),
        _ => octet_string(&bytes),
    };

    Decoded {
        text,
        used,
        remaining,
    }
}

fn octet_string(bytes: &[u8]) -> String {
    if bytes.is_empty() {
        String::new()
    } else {
        format!("0x{}", hex::encode_upper(bytes))
    }
}

/// `InetAddress`, `InetAddressMissingSize` and `LldpPortId`: a discriminator
/// sub-identifier picks the concrete type of what follows.
fn decode_discriminated(oids: &[u32], layout: &Layout<'_>) -> Decoded {
    let index_type = layout.index_type;
    let missing_size = index_type == IndexType::InetAddressMissingSize;
    let (head, values) = split_oid(oids, if missing_size { 1 } else { 2 });

    match index_type.resolve(i64::from(head[0])) {
        Some(concrete) if concrete.is_sized() => {
            // Hand the size sub-identifier on; the inner decode reports it as used.
            let mut sized = Vec::with_capacity(values.len() + 1);
            sized.push(head[1]);
            sized.extend_from_slice(&values);
            let inner = decode(&sized, &layout.retyped(concrete));
            let mut used = vec![head[0]];
            used.extend(inner.used);
            Decoded {
                text: inner.text,
                used,
                remaining: inner.remaining,
            }
        }
        Some(concrete) => {
            let inner = decode(&values, &layout.retyped(concrete));
            let mut used = head;
            used.extend(inner.used);
            Decoded {
                text: inner.text,
                used,
                remaining: inner.remaining,
            }
        }
        None if missing_size => {
            // Size unknown: everything that remains belongs to this index.
            decode(oids, &layout.retyped(IndexType::OctetString).implied())
        }
        None => {
            // Discriminator and size are kept in the rendered bytes.
            let size = head[1] as usize + 2;
            decode(oids, &layout.retyped(IndexType::OctetString).fixed(size))
        }
    }
}
