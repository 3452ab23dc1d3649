//! Scrape planning: rewriting a module's request lists with dynamic filters.
//!
//! A filter walks one column, keeps the instances whose value matches one
//! of its patterns, and replaces walks of its target columns with point
//! queries of just those instances. Filters run in declaration order, each
//! on the output of the previous one.

use crate::config::{DynamicFilter, IndexType, Module};
use crate::format;
use crate::metrics::Metrics;
use crate::oid::Oid;
use crate::pdu::Pdu;
use crate::scraper::Scraper;
use regex::Regex;

/// Requests to issue for one module.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Plan {
    /// Instance OIDs for point queries.
    pub get: Vec<Oid>,
    /// Subtree roots to walk.
    pub walk: Vec<Oid>,
}

impl Plan {
    /// The module's requests before any filter is applied.
    pub fn from_module(module: &Module) -> Self {
        Self {
            get: module.get.clone(),
            walk: module.walk.clone(),
        }
    }
}

/// Evaluate `module`'s filters against the agent and return the rewritten plan.
///
/// A filter whose column cannot be walked is skipped, leaving its targets
/// unrestricted.
pub async fn plan<S: Scraper>(scraper: &S, module: &Module, metrics: &Metrics) -> Plan {
    let mut plan = Plan::from_module(module);
    for filter in &module.filters {
        let pdus = match scraper.walk(&filter.oid).await {
            Ok(pdus) => pdus,
            Err(e) => {
                tracing::info!(target: "snmp_exporter::scrape", { oid = %filter.oid, error = %e }, "error getting OID, won't do any filter on this oid");
                continue;
            }
        };
        let allowed = allowed_indices(filter, &pdus, metrics);
        apply_filter(&mut plan, filter, &allowed);
    }
    plan
}

/// Last arc of every PDU whose DisplayString rendering matches one of the
/// filter's patterns. Patterns match anywhere in the value.
pub fn allowed_indices(filter: &DynamicFilter, pdus: &[Pdu], metrics: &Metrics) -> Vec<u32> {
    tracing::debug!(target: "snmp_exporter::scrape", { oid = %filter.oid }, "evaluating filter");
    let patterns: Vec<Regex> = filter
        .values
        .iter()
        .filter_map(|value| match Regex::new(value) {
            Ok(re) => Some(re),
            Err(e) => {
                tracing::warn!(target: "snmp_exporter::scrape", { oid = %filter.oid, pattern = %value, error = %e }, "invalid filter pattern, ignoring it");
                None
            }
        })
        .collect();

    let mut allowed = Vec::new();
    for pdu in pdus {
        let text = format::as_string(&pdu.value, Some(IndexType::DisplayString), &[], metrics);
        if patterns.iter().any(|re| re.is_match(&text))
            && let Some(index) = pdu.name.last()
        {
            tracing::trace!(target: "snmp_exporter::scrape", { oid = %pdu.name, index }, "caching index");
            allowed.push(index);
        }
    }
    allowed
}

/// Rewrite `plan` for one filter.
///
/// Walks of a target column are dropped, gets at or under a target column
/// are dropped, and `target.index` is queried for every allowed index.
pub fn apply_filter(plan: &mut Plan, filter: &DynamicFilter, allowed: &[u32]) {
    plan.walk.retain(|root| !filter.targets.contains(root));
    plan.get
        .retain(|oid| !filter.targets.iter().any(|target| oid.starts_with(target)));
    for target in &filter.targets {
        for index in allowed {
            plan.get.push(target.child(*index));
        }
    }
}
