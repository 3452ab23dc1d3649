//! Scrape execution: running a plan through a scraper.

use crate::config::{Module, WalkParams};
use crate::error::{Error, ErrorStatus, Result};
use crate::metrics::Metrics;
use crate::pdu::Pdu;
use crate::planner::{self, Plan};
use crate::scraper::{Scraper, Version};
use tracing::instrument;

/// Largest number of OIDs put in one Get request.
///
/// SNMPv1 agents report a single failing OID per response, so v1 always
/// asks for one at a time.
///
/// ```
/// use snmp_exporter::config::WalkParams;
/// use snmp_exporter::executor::max_oids_per_get;
/// use snmp_exporter::scraper::Version;
///
/// let params = WalkParams { max_repetitions: 10, ..Default::default() };
/// assert_eq!(max_oids_per_get(Version::V2c, &params), 10);
/// assert_eq!(max_oids_per_get(Version::V1, &params), 1);
/// ```
pub fn max_oids_per_get(version: Version, params: &WalkParams) -> usize {
    if version == Version::V1 {
        return 1;
    }
    (params.max_repetitions as usize).max(1)
}

/// Plan and run every request of `module` against one target.
///
/// Returns the PDUs of all gets and walks in request order. Any failure of
/// a get or a content walk aborts the scrape.
#[instrument(
    level = "debug",
    skip_all,
    err,
    fields(snmp.target = %target, snmp.version = %version)
)]
pub async fn scrape_target<S: Scraper>(
    scraper: &S,
    target: &str,
    version: Version,
    module: &Module,
    metrics: &Metrics,
) -> Result<Vec<Pdu>> {
    let plan = planner::plan(scraper, module, metrics).await;
    execute(scraper, target, version, &module.walk_params, &plan).await
}

/// Run a plan: point queries first, then walks.
pub async fn execute<S: Scraper>(
    scraper: &S,
    target: &str,
    version: Version,
    params: &WalkParams,
    plan: &Plan,
) -> Result<Vec<Pdu>> {
    let mut pdus = Vec::new();

    let max_oids = max_oids_per_get(version, params);
    for chunk in plan.get.chunks(max_oids) {
        let packet = scraper.get(chunk).await?;
        match packet.error_status {
            ErrorStatus::NO_ERROR => {}
            ErrorStatus::NO_SUCH_NAME if version == Version::V1 => {
                tracing::debug!(target: "snmp_exporter::scrape", { oid = %chunk[0] }, "OID not supported by target");
                continue;
            }
            status => {
                return Err(Error::Snmp {
                    target: target.to_string(),
                    status,
                }
                .boxed());
            }
        }
        for pdu in packet.variables {
            if pdu.is_missing() {
                tracing::debug!(target: "snmp_exporter::scrape", { oid = %pdu.name }, "OID not supported by target");
                continue;
            }
            pdus.push(pdu);
        }
    }

    for root in &plan.walk {
        let walked = scraper.walk(root).await?;
        let before = pdus.len();
        pdus.extend(walked.into_iter().filter(|pdu| pdu.name.starts_with(root)));
        tracing::trace!(target: "snmp_exporter::scrape", { oid = %root, pdus = pdus.len() - before }, "walk completed");
    }

    Ok(pdus)
}
