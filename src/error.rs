//! Error types for snmp-exporter.
//!
//! This module provides:
//!
//! - [`Error`] - The main error type covering scrape, configuration and data failures
//! - [`ErrorStatus`] - error status carried by a response PDU
//!
//! # Error Handling
//!
//! Errors are boxed for efficiency: `Result<T> = Result<T, Box<Error>>`.
//!
//! Scrape-level failures ([`Error::Transport`], [`Error::Timeout`],
//! [`Error::Snmp`], [`Error::Cancelled`]) end the scrape of one module and
//! surface as an `snmp_error` sample. Data-level failures
//! ([`Error::InvalidDateAndTime`] and friends) only ever drop a single sample.
//!
//! ```rust
//! use snmp_exporter::{Error, ErrorStatus, Result};
//!
//! fn describe(result: Result<()>) -> String {
//!     match result {
//!         Ok(()) => "ok".into(),
//!         Err(e) => match &*e {
//!             Error::Snmp { status: ErrorStatus::NO_SUCH_NAME, .. } => "missing".into(),
//!             Error::Timeout { target, .. } => format!("{target} unreachable"),
//!             other => other.to_string(),
//!         },
//!     }
//! }
//! ```

use std::path::PathBuf;
use std::time::Duration;

/// Result type alias using the library's boxed Error type.
pub type Result<T> = std::result::Result<T, Box<Error>>;

/// The main error type for all snmp-exporter operations.
///
/// Errors are boxed (via [`Result`]) to keep the size small on the stack.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Connect, IO or decoding failure inside the scraper.
    #[error("error communicating with target {target}: {message}")]
    Transport { target: String, message: Box<str> },

    /// Request timed out after retries.
    #[error("timeout after {elapsed:?} waiting for {target} ({retries} retries)")]
    Timeout {
        target: String,
        elapsed: Duration,
        retries: u32,
    },

    /// The enclosing scrape was cancelled.
    #[error("scrape of {target} cancelled")]
    Cancelled { target: String },

    /// Non-zero error status in a response.
    #[error("error reported by target {target}: Error Status {}", .status.0)]
    Snmp { target: String, status: ErrorStatus },

    /// Invalid OID format.
    #[error("invalid OID: {input:?}")]
    InvalidOid { input: Box<str> },

    /// Target string that does not follow `[transport://]host[:port]`.
    #[error("invalid target {input:?}: {message}")]
    InvalidTarget { input: Box<str>, message: Box<str> },

    /// Invalid configuration.
    #[error("configuration error: {message}")]
    Config { message: Box<str> },

    /// Reading a configuration file failed.
    #[error("error reading {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A configuration file is not valid YAML for the config model.
    #[error("error parsing {}: {source}", .path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// A time value that arrived as something other than an octet string.
    #[error("{what} expects an octet string, got {found}")]
    NotOctetString {
        what: &'static str,
        found: &'static str,
    },

    /// DateAndTime value with a length other than 8 or 11 bytes.
    #[error("invalid DateAndTime length {len}")]
    InvalidDateAndTime { len: usize },

    /// DateAndTime value whose fields do not form a valid timestamp.
    #[error("invalid DateAndTime value: {message}")]
    DateAndTimeRange { message: Box<str> },

    /// NTP timestamp that is not exactly 8 bytes.
    #[error("invalid NTPTimeStamp length {len}")]
    InvalidNtpTimestamp { len: usize },

    /// Text that does not match the configured `datetime_pattern`.
    #[error("error parsing date and time {value:?} with pattern {pattern:?}")]
    DateTimePattern { value: Box<str>, pattern: Box<str> },

    /// The value of a `Bits` metric was not an octet string.
    #[error("BITS type was not a BITSTRING on the wire for metric {metric}")]
    BitsNotBytes { metric: Box<str> },

    /// Rendering samples in the Prometheus text format failed.
    #[error("error encoding metrics: {source}")]
    Encode {
        #[source]
        source: prometheus::Error,
    },
}

impl Error {
    /// Box this error (convenience for constructing boxed errors).
    pub fn boxed(self) -> Box<Self> {
        Box::new(self)
    }

    pub(crate) fn config(message: impl Into<Box<str>>) -> Box<Self> {
        Error::Config {
            message: message.into(),
        }
        .boxed()
    }

    /// True for failures that end the scrape of a module rather than a single sample.
    pub fn is_scrape_error(&self) -> bool {
        matches!(
            self,
            Error::Transport { .. }
                | Error::Timeout { .. }
                | Error::Cancelled { .. }
                | Error::Snmp { .. }
        )
    }
}

/// Error status of a response PDU (RFC 3416).
///
/// The scrape logic only distinguishes success, `noSuchName` under SNMPv1
/// and "anything else", so the status stays a raw code with a few names.
///
/// ```
/// use snmp_exporter::ErrorStatus;
///
/// let status = ErrorStatus::from(2);
/// assert_eq!(status, ErrorStatus::NO_SUCH_NAME);
/// assert_eq!(status.to_string(), "noSuchName");
/// assert_eq!(ErrorStatus::from(42).to_string(), "unknown(42)");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ErrorStatus(pub i32);

impl ErrorStatus {
    pub const NO_ERROR: Self = Self(0);
    pub const TOO_BIG: Self = Self(1);
    /// Only sent by SNMPv1 agents; later versions use exception values.
    pub const NO_SUCH_NAME: Self = Self(2);
    pub const GEN_ERR: Self = Self(5);

    const NAMES: [&'static str; 19] = [
        "noError",
        "tooBig",
        "noSuchName",
        "badValue",
        "readOnly",
        "genErr",
        "noAccess",
        "wrongType",
        "wrongLength",
        "wrongEncoding",
        "wrongValue",
        "noCreation",
        "inconsistentValue",
        "resourceUnavailable",
        "commitFailed",
        "undoFailed",
        "authorizationError",
        "notWritable",
        "inconsistentName",
    ];

    pub fn is_error(self) -> bool {
        self != Self::NO_ERROR
    }

    /// RFC name of the status, if it is a known code.
    pub fn name(self) -> Option<&'static str> {
        usize::try_from(self.0)
            .ok()
            .and_then(|i| Self::NAMES.get(i).copied())
    }
}

impl From<i32> for ErrorStatus {
    fn from(code: i32) -> Self {
        Self(code)
    }
}

impl std::fmt::Display for ErrorStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "unknown({})", self.0),
        }
    }
}
