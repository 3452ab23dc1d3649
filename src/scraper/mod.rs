//! Scraper port.
//!
//! The core never speaks SNMP on the wire. It drives a [`Scraper`], which
//! owns one connection to one agent and performs point queries and subtree
//! walks. A [`ScraperFactory`] builds one scraper per collector worker.
//!
//! [`CachingScraper`] memoizes walks within a scrape, and `MockScraper`
//! (with the `testing` feature) serves canned data for tests.

mod cache;
mod target;

#[cfg(any(test, feature = "testing"))]
mod mock;

pub use cache::CachingScraper;
pub use target::{SourceAddress, Target};

#[cfg(any(test, feature = "testing"))]
pub use mock::*;

use crate::config::WalkParams;
use crate::error::Result;
use crate::oid::Oid;
use crate::pdu::{Packet, Pdu};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// SNMP protocol version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Version {
    /// Single-variable GetNext walks; one OID per Get.
    V1,
    /// Bulk walks.
    #[default]
    V2c,
    /// Bulk walks.
    V3,
}

impl Version {
    /// Map the numeric version of an auth entry. Anything but 1 and 3 is v2c.
    ///
    /// ```
    /// use snmp_exporter::scraper::Version;
    ///
    /// assert_eq!(Version::from_number(1), Version::V1);
    /// assert_eq!(Version::from_number(2), Version::V2c);
    /// assert_eq!(Version::from_number(3), Version::V3);
    /// ```
    pub fn from_number(version: u8) -> Self {
        match version {
            1 => Version::V1,
            3 => Version::V3,
            _ => Version::V2c,
        }
    }

    /// Whether walks use GetBulk.
    pub fn uses_bulk(self) -> bool {
        self != Version::V1
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Version::V1 => f.write_str("v1"),
            Version::V2c => f.write_str("v2c"),
            Version::V3 => f.write_str("v3"),
        }
    }
}

/// Callback invoked by a scraper for every packet event.
pub type Hook = Arc<dyn Fn() + Send + Sync>;

/// Callback invoked with the round-trip time of every answered packet.
pub type DurationHook = Arc<dyn Fn(Duration) + Send + Sync>;

/// Per-packet callbacks used to count traffic.
///
/// Scrapers call [`sent`](Self::sent) for every packet put on the wire,
/// retries included, [`retried`](Self::retried) for every retry and
/// [`answered`](Self::answered) when a response arrives.
#[derive(Clone, Default)]
pub struct RequestHooks {
    pub on_sent: Option<Hook>,
    pub on_retry: Option<Hook>,
    pub on_response: Option<DurationHook>,
}

impl RequestHooks {
    pub fn sent(&self) {
        if let Some(hook) = &self.on_sent {
            hook();
        }
    }

    pub fn retried(&self) {
        if let Some(hook) = &self.on_retry {
            hook();
        }
    }

    pub fn answered(&self, elapsed: Duration) {
        if let Some(hook) = &self.on_response {
            hook(elapsed);
        }
    }
}

impl fmt::Debug for RequestHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestHooks")
            .field("on_sent", &self.on_sent.is_some())
            .field("on_retry", &self.on_retry.is_some())
            .field("on_response", &self.on_response.is_some())
            .finish()
    }
}

/// Settings pushed into a scraper before each module is scraped.
#[derive(Debug, Clone, Default)]
pub struct ScraperOptions {
    pub version: Version,
    pub walk_params: WalkParams,
    /// SNMPv3 context name.
    pub context_name: String,
    pub hooks: RequestHooks,
}

/// One connection to one agent.
///
/// Scrapers are used by a single worker at a time. Errors are returned as
/// [`Error::Transport`](crate::Error::Transport),
/// [`Error::Timeout`](crate::Error::Timeout) or
/// [`Error::Cancelled`](crate::Error::Cancelled); a non-zero error status in
/// a Get response is *not* an error and is left in the returned [`Packet`].
pub trait Scraper: Send + Sync {
    /// Point query of `oids` in a single request.
    ///
    /// Missing instances come back as `NoSuchObject` / `NoSuchInstance`
    /// variables.
    fn get(&self, oids: &[Oid]) -> impl Future<Output = Result<Packet>> + Send;

    /// Every leaf under `root`: GetNext for v1, GetBulk otherwise.
    fn walk(&self, root: &Oid) -> impl Future<Output = Result<Vec<Pdu>>> + Send;

    /// Open the connection.
    fn connect(&self) -> impl Future<Output = Result<()>> + Send;

    /// Close the connection.
    fn close(&self) -> impl Future<Output = Result<()>> + Send;

    /// Apply `options` to subsequent requests.
    fn set_options(&mut self, options: &ScraperOptions);
}

/// Builds scrapers for collector workers.
pub trait ScraperFactory: Send + Sync {
    type Scraper: Scraper + 'static;

    /// Create an unconnected scraper for `target`, optionally bound to `source`.
    fn create(&self, target: &Target, source: Option<&SourceAddress>) -> Result<Self::Scraper>;
}
