//! Mock scraper for testing.
//!
//! Serves PDUs from an in-memory MIB view without any network, records
//! every request, and can be told to fail in the ways a real agent does.

use super::{Scraper, ScraperFactory, ScraperOptions, SourceAddress, Target};
use crate::error::{Error, ErrorStatus, Result};
use crate::oid::Oid;
use crate::pdu::{Packet, Pdu};
use crate::value::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Mock scraper state shared between clones.
#[derive(Default)]
struct MockScraperInner {
    /// Agent view served by get and walk.
    mib: BTreeMap<Oid, Pdu>,
    /// Walk answers that bypass `mib`.
    walks: HashMap<Oid, Vec<Pdu>>,
    /// Walk roots that fail.
    walk_errors: HashMap<Oid, String>,
    /// Get requests containing one of these OIDs answer with the status.
    get_statuses: HashMap<Oid, ErrorStatus>,
    connect_error: Option<String>,
    create_error: Option<String>,
    /// Extra attempts reported for every request.
    retries_per_request: u32,
    /// Time every get and walk takes to answer.
    delay: Option<Duration>,
    options: ScraperOptions,
    get_calls: Vec<Vec<Oid>>,
    walk_calls: Vec<Oid>,
    connects: usize,
    closes: usize,
    created: usize,
}

/// Mock scraper for testing the scrape pipeline.
///
/// Clones share state, so a test keeps one handle to inspect the calls made
/// through the others. The mock is its own [`ScraperFactory`]: every worker
/// receives a clone.
///
/// # Example
///
/// ```rust
/// use snmp_exporter::scraper::MockScraper;
/// use snmp_exporter::{oid, Pdu};
///
/// let mock = MockScraper::new();
/// mock.add_pdu(Pdu::new(oid!(1, 3, 6, 1, 2, 1, 1, 5, 0), "core-1"));
/// mock.fail_walk(oid!(1, 3, 6, 1, 2, 1, 31), "timeout");
/// assert!(mock.walk_calls().is_empty());
/// ```
#[derive(Clone, Default)]
pub struct MockScraper {
    inner: Arc<Mutex<MockScraperInner>>,
}

impl MockScraper {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockScraperInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Add a PDU to the agent view.
    pub fn add_pdu(&self, pdu: Pdu) {
        self.lock().mib.insert(pdu.name.clone(), pdu);
    }

    /// Add several PDUs to the agent view.
    pub fn add_pdus(&self, pdus: impl IntoIterator<Item = Pdu>) {
        let mut inner = self.lock();
        for pdu in pdus {
            inner.mib.insert(pdu.name.clone(), pdu);
        }
    }

    /// Answer walks of `root` with exactly `pdus`, whatever they contain.
    pub fn set_walk(&self, root: Oid, pdus: Vec<Pdu>) {
        self.lock().walks.insert(root, pdus);
    }

    /// Make walks of `root` fail with a transport error.
    pub fn fail_walk(&self, root: Oid, message: impl Into<String>) {
        self.lock().walk_errors.insert(root, message.into());
    }

    /// Answer any get request that includes `oid` with `status`.
    pub fn set_get_status(&self, oid: Oid, status: ErrorStatus) {
        self.lock().get_statuses.insert(oid, status);
    }

    /// Make `connect` fail.
    pub fn fail_connect(&self, message: impl Into<String>) {
        self.lock().connect_error = Some(message.into());
    }

    /// Make [`ScraperFactory::create`] fail.
    pub fn fail_create(&self, message: impl Into<String>) {
        self.lock().create_error = Some(message.into());
    }

    /// Report `retries` retries (and as many extra packets) for every request.
    pub fn set_retries_per_request(&self, retries: u32) {
        self.lock().retries_per_request = retries;
    }

    /// Make every get and walk take `delay` before answering.
    pub fn set_delay(&self, delay: Duration) {
        self.lock().delay = Some(delay);
    }

    /// OID lists of every get, in call order.
    pub fn get_calls(&self) -> Vec<Vec<Oid>> {
        self.lock().get_calls.clone()
    }

    /// Roots of every walk, in call order.
    pub fn walk_calls(&self) -> Vec<Oid> {
        self.lock().walk_calls.clone()
    }

    /// Options from the most recent `set_options`.
    pub fn options(&self) -> ScraperOptions {
        self.lock().options.clone()
    }

    pub fn connect_count(&self) -> usize {
        self.lock().connects
    }

    pub fn close_count(&self) -> usize {
        self.lock().closes
    }

    /// Number of scrapers handed out by the factory.
    pub fn created_count(&self) -> usize {
        self.lock().created
    }

    async fn respond_later(&self) {
        let delay = self.lock().delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }

    /// Fire the packet hooks for `requests` requests.
    fn account(&self, options: &ScraperOptions, requests: usize, retries: u32) {
        for _ in 0..requests {
            options.hooks.sent();
            for _ in 0..retries {
                options.hooks.retried();
                options.hooks.sent();
            }
            options.hooks.answered(Duration::ZERO);
        }
    }
}

/// Requests a real walk of `returned` PDUs takes: one GetNext per PDU for
/// v1, one GetBulk per `max_repetitions` PDUs otherwise, plus the request
/// that steps past the end of the subtree.
fn walk_requests(options: &ScraperOptions, returned: usize) -> usize {
    if options.version.uses_bulk() {
        let per_request = (options.walk_params.max_repetitions as usize).max(1);
        returned / per_request + 1
    } else {
        returned + 1
    }
}

impl Scraper for MockScraper {
    async fn get(&self, oids: &[Oid]) -> Result<Packet> {
        self.respond_later().await;
        let (packet, options, retries) = {
            let mut inner = self.lock();
            inner.get_calls.push(oids.to_vec());

            let failing = oids
                .iter()
                .enumerate()
                .find_map(|(i, oid)| inner.get_statuses.get(oid).map(|s| (i, *s)));
            let packet = match failing {
                Some((i, status)) => Packet::error(status, i as u32 + 1),
                None => Packet::ok(
                    oids.iter()
                        .map(|oid| {
                            inner
                                .mib
                                .get(oid)
                                .cloned()
                                .unwrap_or_else(|| Pdu::new(oid.clone(), Value::NoSuchObject))
                        })
                        .collect(),
                ),
            };
            (packet, inner.options.clone(), inner.retries_per_request)
        };
        self.account(&options, 1, retries);
        Ok(packet)
    }

    async fn walk(&self, root: &Oid) -> Result<Vec<Pdu>> {
        self.respond_later().await;
        let (result, options, retries) = {
            let mut inner = self.lock();
            inner.walk_calls.push(root.clone());

            let result = if let Some(message) = inner.walk_errors.get(root) {
                Err(Error::Transport {
                    target: "mock".into(),
                    message: message.as_str().into(),
                }
                .boxed())
            } else if let Some(pdus) = inner.walks.get(root) {
                Ok(pdus.clone())
            } else {
                Ok(inner
                    .mib
                    .range(root.clone()..)
                    .take_while(|(name, _)| name.starts_with(root))
                    .map(|(_, pdu)| pdu.clone())
                    .collect())
            };
            (result, inner.options.clone(), inner.retries_per_request)
        };
        let requests = match &result {
            Ok(pdus) => walk_requests(&options, pdus.len()),
            Err(_) => 1,
        };
        self.account(&options, requests, retries);
        result
    }

    async fn connect(&self) -> Result<()> {
        let mut inner = self.lock();
        inner.connects += 1;
        match &inner.connect_error {
            Some(message) => Err(Error::Transport {
                target: "mock".into(),
                message: message.as_str().into(),
            }
            .boxed()),
            None => Ok(()),
        }
    }

    async fn close(&self) -> Result<()> {
        self.lock().closes += 1;
        Ok(())
    }

    fn set_options(&mut self, options: &ScraperOptions) {
        self.lock().options = options.clone();
    }
}

impl ScraperFactory for MockScraper {
    type Scraper = MockScraper;

    fn create(&self, target: &Target, _source: Option<&SourceAddress>) -> Result<MockScraper> {
        let mut inner = self.lock();
        if let Some(message) = &inner.create_error {
            return Err(Error::Transport {
                target: target.to_string(),
                message: message.as_str().into(),
            }
            .boxed());
        }
        inner.created += 1;
        Ok(self.clone())
    }
}
