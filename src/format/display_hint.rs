//! RFC 2579 DISPLAY-HINT formatting for OCTET STRING values.
//!
//! A hint is parsed into a list of [`FormatOp`]s, which is also the form the
//! configuration carries (`format_spec`). [`apply`] interprets the list over a
//! byte string; [`render`] does both steps.
//!
//! ```
//! use snmp_exporter::format::display_hint;
//!
//! // IPv4 address
//! assert_eq!(display_hint::render("1d.1d.1d.1d", &[192, 168, 1, 1]).as_deref(), Some("192.168.1.1"));
//!
//! // MAC address (implicit repetition), hex is uppercase
//! assert_eq!(display_hint::render("1x:", &[0x00, 0x1a, 0x2b, 0x3c, 0x4d, 0x5e]).as_deref(), Some("00:1A:2B:3C:4D:5E"));
//!
//! // Star prefix with terminator
//! assert_eq!(display_hint::render("*1d./1d", &[3, 10, 20, 30, 40]).as_deref(), Some("10.20.30/40"));
//! ```

use crate::error::{Error, Result};
use crate::format::hex;
use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// Output format of one hint specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HintFormat {
    /// Big-endian unsigned decimal.
    #[serde(rename = "d")]
    Decimal,
    /// Two uppercase hex digits per byte.
    #[serde(rename = "x")]
    Hex,
    /// Big-endian unsigned octal.
    #[serde(rename = "o")]
    Octal,
    /// Bytes verbatim.
    #[serde(rename = "a")]
    Ascii,
    /// Bytes verbatim.
    #[serde(rename = "t")]
    Utf8,
}

impl HintFormat {
    fn from_byte(c: u8) -> Option<Self> {
        match c {
            b'd' => Some(Self::Decimal),
            b'x' => Some(Self::Hex),
            b'o' => Some(Self::Octal),
            b'a' => Some(Self::Ascii),
            b't' => Some(Self::Utf8),
            _ => None,
        }
    }
}

/// One parsed DISPLAY-HINT specification: `[*]<take><fmt>[sep][term]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FormatOp {
    /// Bytes consumed per application.
    pub take: usize,
    pub fmt: HintFormat,
    /// Emitted after each application, except at end of data or before the terminator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sep: Option<char>,
    /// Emitted after the repeated group. Only meaningful with `star_prefix`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub term: Option<char>,
    /// First unread byte of the value is the repeat count.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub star_prefix: bool,
}

impl FormatOp {
    pub fn new(take: usize, fmt: HintFormat) -> Self {
        Self {
            take,
            fmt,
            sep: None,
            term: None,
            star_prefix: false,
        }
    }

    pub fn sep(mut self, sep: char) -> Self {
        self.sep = Some(sep);
        self
    }

    pub fn term(mut self, term: char) -> Self {
        self.term = Some(term);
        self
    }

    pub fn star(mut self) -> Self {
        self.star_prefix = true;
        self
    }

    /// Whether one application of this op is guaranteed to consume input.
    fn consumes(&self) -> bool {
        self.take > 0 || self.star_prefix
    }
}

/// Parse a DISPLAY-HINT string into format operations.
///
/// Fails on an empty hint, a missing take count, a take count that
/// overflows, or a missing or unknown format letter. A separator is any byte
/// other than a digit or `*`; a terminator is only read after a separator on
/// a starred spec.
///
/// ```
/// use snmp_exporter::format::display_hint::{parse, FormatOp, HintFormat};
///
/// let ops = parse("1x:").unwrap();
/// assert_eq!(ops, vec![FormatOp::new(1, HintFormat::Hex).sep(':')]);
///
/// assert!(parse("1z").is_err());
/// assert!(parse("d").is_err());
/// ```
pub fn parse(hint: &str) -> Result<Vec<FormatOp>> {
    let bad = |message: &str| Error::config(format!("invalid display hint {hint:?}: {message}"));
    if hint.is_empty() {
        return Err(bad("empty hint"));
    }

    let bytes = hint.as_bytes();
    let mut ops = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        // (1) Optional '*' repeat indicator
        let star_prefix = bytes[pos] == b'*';
        if star_prefix {
            pos += 1;
        }

        // (2) Octet length - one or more decimal digits (required)
        if pos >= bytes.len() || !bytes[pos].is_ascii_digit() {
            return Err(bad("expected octet length"));
        }
        let mut take = 0usize;
        while pos < bytes.len() && bytes[pos].is_ascii_digit() {
            take = take
                .checked_mul(10)
                .and_then(|t| t.checked_add(usize::from(bytes[pos] - b'0')))
                .ok_or_else(|| bad("octet length overflow"))?;
            pos += 1;
        }

        // (3) Format character (required)
        let fmt = bytes
            .get(pos)
            .and_then(|&c| HintFormat::from_byte(c))
            .ok_or_else(|| bad("expected format character"))?;
        pos += 1;

        let mut op = FormatOp::new(take, fmt);
        op.star_prefix = star_prefix;

        // (4) Optional separator, (5) optional terminator
        if let Some(sep) = separator_at(hint, pos) {
            op.sep = Some(sep);
            pos += sep.len_utf8();
            if star_prefix && let Some(term) = separator_at(hint, pos) {
                op.term = Some(term);
                pos += term.len_utf8();
            }
        }

        ops.push(op);
    }

    Ok(ops)
}

fn separator_at(hint: &str, pos: usize) -> Option<char> {
    let c = hint.get(pos..)?.chars().next()?;
    (!c.is_ascii_digit() && c != '*').then_some(c)
}

/// Apply parsed format operations to raw bytes.
///
/// Returns `None` when the operations cannot render the data: empty input,
/// no operations, a numeric chunk wider than 8 bytes, or a last operation
/// that would have to repeat without consuming anything.
///
/// `a` and `t` emit bytes verbatim; callers sanitize the result to valid
/// UTF-8 with [`sanitize_utf8`](crate::format::sanitize_utf8).
pub fn apply(ops: &[FormatOp], data: &[u8]) -> Option<Vec<u8>> {
    if ops.is_empty() || data.is_empty() {
        return None;
    }

    let mut out: Vec<u8> = Vec::with_capacity(data.len() * 4);
    let mut text = String::new();
    let mut op_idx = 0;
    let mut data_pos = 0;

    while data_pos < data.len() {
        // Hint exhausted: the last spec repeats until data runs out.
        if op_idx >= ops.len() {
            if !ops[ops.len() - 1].consumes() {
                return None;
            }
            op_idx = ops.len() - 1;
        }
        let op = &ops[op_idx];
        op_idx += 1;

        let repeat_count = if op.star_prefix {
            let count = usize::from(data[data_pos]);
            data_pos += 1;
            count
        } else {
            1
        };

        let mut r = 0;
        while r < repeat_count && data_pos < data.len() {
            let end = data_pos.saturating_add(op.take).min(data.len());
            let chunk = &data[data_pos..end];

            text.clear();
            match op.fmt {
                HintFormat::Decimal | HintFormat::Octal => {
                    if chunk.len() > 8 {
                        return None;
                    }
                    let val = chunk.iter().fold(0u64, |acc, &b| (acc << 8) | u64::from(b));
                    if op.fmt == HintFormat::Decimal {
                        let _ = write!(text, "{}", val);
                    } else {
                        let _ = write!(text, "{:o}", val);
                    }
                    out.extend_from_slice(text.as_bytes());
                }
                HintFormat::Hex => {
                    hex::write_upper(&mut text, chunk);
                    out.extend_from_slice(text.as_bytes());
                }
                HintFormat::Ascii | HintFormat::Utf8 => out.extend_from_slice(chunk),
            }
            data_pos = end;

            // Separator is suppressed at end of data and right before the terminator.
            let last_of_group = op.term.is_some() && r + 1 == repeat_count;
            if let Some(sep) = op.sep
                && data_pos < data.len()
                && !last_of_group
            {
                push_char(&mut out, sep);
            }
            r += 1;
        }

        if let Some(term) = op.term
            && data_pos < data.len()
        {
            push_char(&mut out, term);
        }
    }

    Some(out)
}

fn push_char(out: &mut Vec<u8>, c: char) {
    let mut buf = [0u8; 4];
    out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
}

/// Parse `hint` and apply it to `data`, sanitizing the result to valid UTF-8.
///
/// `None` means "no hint applied"; the caller falls back to its default rendering.
///
/// ```
/// use snmp_exporter::format::display_hint::render;
///
/// assert_eq!(render("1d.", &[1, 2, 3, 4, 5]).as_deref(), Some("1.2.3.4.5"));
/// assert_eq!(render("0d", &[1, 2, 3]), None);
/// assert_eq!(render("", &[1, 2, 3]), None);
/// ```
pub fn render(hint: &str, data: &[u8]) -> Option<String> {
    let ops = parse(hint).ok()?;
    apply(&ops, data).map(|raw| crate::format::sanitize_utf8(&raw))
}
