//! Walk memoization for a single scrape.

use super::{Scraper, ScraperOptions};
use crate::error::Result;
use crate::oid::Oid;
use crate::pdu::{Packet, Pdu};
use std::collections::HashMap;
use std::sync::Mutex;

/// Wraps a scraper and answers repeated walks of the same root from memory.
///
/// Only successful walks are remembered. Gets always reach the inner
/// scraper. The cache lives as long as the wrapper; create one per scrape.
pub struct CachingScraper<S> {
    inner: S,
    walks: Mutex<HashMap<Oid, Vec<Pdu>>>,
}

impl<S: Scraper> CachingScraper<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            walks: Mutex::new(HashMap::new()),
        }
    }

    /// The wrapped scraper.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn into_inner(self) -> S {
        self.inner
    }

    fn cached(&self, root: &Oid) -> Option<Vec<Pdu>> {
        self.walks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(root)
            .cloned()
    }
}

impl<S: Scraper> Scraper for CachingScraper<S> {
    async fn get(&self, oids: &[Oid]) -> Result<Packet> {
        self.inner.get(oids).await
    }

    async fn walk(&self, root: &Oid) -> Result<Vec<Pdu>> {
        if let Some(pdus) = self.cached(root) {
            tracing::trace!(target: "snmp_exporter::scrape", { oid = %root, pdus = pdus.len() }, "walk served from cache");
            return Ok(pdus);
        }
        let pdus = self.inner.walk(root).await?;
        self.walks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(root.clone(), pdus.clone());
        Ok(pdus)
    }

    async fn connect(&self) -> Result<()> {
        self.inner.connect().await
    }

    async fn close(&self) -> Result<()> {
        self.inner.close().await
    }

    fn set_options(&mut self, options: &ScraperOptions) {
        self.inner.set_options(options);
    }
}
