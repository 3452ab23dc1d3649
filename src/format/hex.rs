//! Hex rendering.
//!
//! Labels use uppercase digits (`0xC0A80101`, `01:FF:00:00:00:10`); logs use
//! the lowercase lazy [`Bytes`] form.

use std::fmt;

const UPPER: &[u8; 16] = b"0123456789ABCDEF";

/// Two uppercase digits per byte.
///
/// ```
/// use snmp_exporter::format::hex::encode_upper;
///
/// assert_eq!(encode_upper(&[0x41, 0x20, 0xff]), "4120FF");
/// ```
pub fn encode_upper(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    write_upper(&mut out, bytes);
    out
}

pub fn write_upper(out: &mut String, bytes: &[u8]) {
    for &b in bytes {
        out.push(UPPER[usize::from(b >> 4)] as char);
        out.push(UPPER[usize::from(b & 0x0f)] as char);
    }
}

/// Formats only when the log record is actually emitted.
pub struct Bytes<'a>(pub &'a [u8]);

impl fmt::Display for Bytes<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.iter().try_for_each(|b| write!(f, "{b:02x}"))
    }
}
