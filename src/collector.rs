//! Collector driver.
//!
//! A [`Collector`] scrapes a list of modules from one target. It starts a
//! pool of workers, each owning one scraper, feeds them modules through a
//! shared queue, and streams every sample they produce into a sink.
//!
//! Per module a worker emits, in order: `snmp_scrape_walk_duration_seconds`,
//! `snmp_scrape_packets_sent`, `snmp_scrape_packets_retried`,
//! `snmp_scrape_pdus_returned`, the module's own samples, and finally
//! `snmp_scrape_duration_seconds`. A module whose scrape fails emits a single
//! `snmp_error` sample labelled with the module name instead.

use crate::config::{Auth, NamedModule, WalkParams};
use crate::executor;
use crate::metrics::Metrics;
use crate::sample::Sample;
use crate::samples::build_samples;
use crate::scraper::{
    RequestHooks, Scraper, ScraperFactory, ScraperOptions, SourceAddress, Target, Version,
};
use crate::error::Error;
use prometheus::IntGauge;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

const LOG_TARGET: &str = "snmp_exporter::collector";

/// Capacity of the sample channel used by [`Collector::collect_all`].
const SAMPLE_BUFFER: usize = 256;

/// Collector settings.
#[derive(Debug, Clone)]
pub struct CollectorOptions {
    /// Number of workers, each with its own connection. Values below 1 mean 1.
    pub concurrency: usize,
    /// Wrap Counter64 values at 2^53 so they stay exact as floats.
    pub wrap_counters: bool,
    /// Local address to send requests from.
    pub source_address: Option<SourceAddress>,
    /// SNMPv3 context name overriding the one in the auth entry.
    pub context_name: Option<String>,
}

impl Default for CollectorOptions {
    fn default() -> Self {
        Self {
            concurrency: 1,
            wrap_counters: true,
            source_address: None,
            context_name: None,
        }
    }
}

struct Shared<F> {
    target: String,
    auth: Auth,
    modules: Vec<NamedModule>,
    metrics: Metrics,
    factory: F,
    options: CollectorOptions,
}

/// Scrapes a set of modules from one target.
///
/// Cloning is cheap; clones share the configuration.
pub struct Collector<F> {
    shared: Arc<Shared<F>>,
}

impl<F> Clone for Collector<F> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

/// Module queue shared by the workers.
type Queue = Arc<Mutex<mpsc::Receiver<usize>>>;

impl<F> Collector<F>
where
    F: ScraperFactory + 'static,
{
    pub fn new(
        target: impl Into<String>,
        auth: Auth,
        modules: Vec<NamedModule>,
        metrics: Metrics,
        factory: F,
        options: CollectorOptions,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                target: target.into(),
                auth,
                modules,
                metrics,
                factory,
                options,
            }),
        }
    }

    pub fn target(&self) -> &str {
        &self.shared.target
    }

    pub fn modules(&self) -> &[NamedModule] {
        &self.shared.modules
    }

    /// Scrape every module and send the samples to `sink`.
    ///
    /// Returns once all workers have finished. Cancelling `cancel` stops
    /// handing out modules and aborts the scrapes in progress; a worker that
    /// cannot start cancels it for its peers.
    #[instrument(level = "debug", skip_all, fields(snmp.target = %self.shared.target))]
    pub async fn collect(&self, cancel: CancellationToken, sink: mpsc::Sender<Sample>) {
        let cancel = cancel.child_token();
        let workers = self.shared.options.concurrency.max(1);
        let (tx, rx) = mpsc::channel::<usize>(1);
        let queue: Queue = Arc::new(Mutex::new(rx));

        let mut tasks = JoinSet::new();
        for id in 0..workers {
            let shared = Arc::clone(&self.shared);
            let queue = Arc::clone(&queue);
            let sink = sink.clone();
            let cancel = cancel.clone();
            tasks.spawn(async move { shared.worker(id, queue, sink, cancel).await });
        }
        // The receiver must go away with the last worker so `send` fails
        // once nobody is left to take a module.
        drop(queue);
        drop(sink);

        for (i, module) in self.shared.modules.iter().enumerate() {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::debug!(target: LOG_TARGET, { module = %module.name }, "context canceled");
                    break;
                }
                sent = tx.send(i) => {
                    if sent.is_err() {
                        tracing::debug!(target: LOG_TARGET, { module = %module.name }, "no worker left to take module");
                        break;
                    }
                    tracing::debug!(target: LOG_TARGET, { module = %module.name }, "sent module to worker");
                }
            }
        }
        drop(tx);

        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                tracing::warn!(target: LOG_TARGET, { error = %e }, "worker task failed");
            }
        }
        cancel.cancel();
    }

    /// Scrape every module and return all samples.
    pub async fn collect_all(&self, cancel: CancellationToken) -> Vec<Sample> {
        let (tx, mut rx) = mpsc::channel(SAMPLE_BUFFER);
        let gather = async move {
            let mut samples = Vec::new();
            while let Some(sample) = rx.recv().await {
                samples.push(sample);
            }
            samples
        };
        let ((), samples) = tokio::join!(self.collect(cancel, tx), gather);
        samples
    }
}

impl<F> Shared<F>
where
    F: ScraperFactory + 'static,
{
    fn version(&self) -> Version {
        Version::from_number(self.auth.version)
    }

    fn context_name(&self) -> String {
        self.options
            .context_name
            .clone()
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| self.auth.context_name.clone())
    }

    /// `idle -> connecting -> serving -> closed`.
    #[instrument(level = "debug", skip_all, fields(worker = id))]
    async fn worker(&self, id: usize, queue: Queue, sink: mpsc::Sender<Sample>, cancel: CancellationToken) {
        let created = Target::parse(&self.target)
            .and_then(|target| self.factory.create(&target, self.options.source_address.as_ref()));
        let mut scraper = match created {
            Ok(scraper) => scraper,
            Err(e) => {
                tracing::info!(target: LOG_TARGET, { error = %e }, "Failed to create snmp scrape client");
                cancel.cancel();
                emit(&sink, &cancel, Sample::invalid("Error during initialisation of the Worker", e)).await;
                return;
            }
        };

        let use_unconnected_udp_socket = self
            .modules
            .iter()
            .any(|m| m.module.walk_params.use_unconnected_udp_socket);
        scraper.set_options(&ScraperOptions {
            version: self.version(),
            walk_params: WalkParams {
                use_unconnected_udp_socket,
                ..WalkParams::default()
            },
            context_name: self.context_name(),
            hooks: RequestHooks::default(),
        });

        if let Err(e) = scraper.connect().await {
            tracing::info!(target: LOG_TARGET, { error = %e }, "Error connecting to target");
            emit(&sink, &cancel, Sample::invalid("Error connecting to target", e)).await;
            cancel.cancel();
            return;
        }

        loop {
            let next = queue.lock().await.recv().await;
            let Some(index) = next else { break };
            let Some(module) = self.modules.get(index) else { continue };

            tracing::debug!(target: LOG_TARGET, { module = %module.name }, "Starting scrape");
            let start = Instant::now();
            self.collect_module(&mut scraper, module, &sink, &cancel).await;
            let duration = start.elapsed().as_secs_f64();
            tracing::debug!(target: LOG_TARGET, { module = %module.name, duration_seconds = duration }, "Finished scrape");
            self.metrics
                .collection_duration
                .with_label_values(&[module.name.as_str()])
                .observe(duration);

            if sink.is_closed() {
                break;
            }
        }

        if let Err(e) = scraper.close().await {
            tracing::debug!(target: LOG_TARGET, { error = %e }, "error closing scraper");
        }
    }

    #[instrument(level = "debug", skip_all, fields(module = %module.name))]
    async fn collect_module(
        &self,
        scraper: &mut F::Scraper,
        module: &NamedModule,
        sink: &mpsc::Sender<Sample>,
        cancel: &CancellationToken,
    ) {
        let packets = Arc::new(AtomicU64::new(0));
        let retries = Arc::new(AtomicU64::new(0));
        scraper.set_options(&ScraperOptions {
            version: self.version(),
            walk_params: module.module.walk_params.clone(),
            context_name: self.context_name(),
            hooks: self.hooks(&packets, &retries),
        });

        let start = Instant::now();
        let inflight = InFlight::enter(&self.metrics.inflight);
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(Error::Cancelled { target: self.target.clone() }.boxed()),
            result = executor::scrape_target(&*scraper, &self.target, self.version(), &module.module, &self.metrics) => result,
        };
        drop(inflight);

        let pdus = match result {
            Ok(pdus) => pdus,
            Err(e) => {
                tracing::info!(target: LOG_TARGET, { module = %module.name, error = %e }, "Error scraping target");
                let sample = Sample::invalid("Error scraping target", e).with_label("module", &module.name);
                emit(sink, cancel, sample).await;
                return;
            }
        };

        let label = || vec![("module".to_string(), module.name.clone())];
        let meta = [
            (
                "snmp_scrape_walk_duration_seconds",
                "Time SNMP walk/bulkwalk took.",
                start.elapsed().as_secs_f64(),
            ),
            (
                "snmp_scrape_packets_sent",
                "Packets sent for get, bulkget, and walk; including retries.",
                packets.load(Ordering::Relaxed) as f64,
            ),
            (
                "snmp_scrape_packets_retried",
                "Packets retried for get, bulkget, and walk.",
                retries.load(Ordering::Relaxed) as f64,
            ),
            (
                "snmp_scrape_pdus_returned",
                "PDUs returned from get, bulkget, and walk.",
                pdus.len() as f64,
            ),
        ];
        for (name, help, value) in meta {
            if !emit(sink, cancel, Sample::gauge(name, help, value, label())).await {
                return;
            }
        }

        let samples = build_samples(&pdus, &module.module.metrics, &self.metrics, self.options.wrap_counters);
        for sample in samples {
            if !emit(sink, cancel, sample).await {
                return;
            }
        }

        emit(
            sink,
            cancel,
            Sample::gauge(
                "snmp_scrape_duration_seconds",
                "Total SNMP time scrape took (walk and processing).",
                start.elapsed().as_secs_f64(),
                label(),
            ),
        )
        .await;
    }

    /// Hooks that feed both the process-wide counters and this module's tallies.
    fn hooks(&self, packets: &Arc<AtomicU64>, retries: &Arc<AtomicU64>) -> RequestHooks {
        let sent_total = self.metrics.packets.clone();
        let sent = Arc::clone(packets);
        let retry_total = self.metrics.retries.clone();
        let retried = Arc::clone(retries);
        let packet_duration = self.metrics.packet_duration.clone();

        RequestHooks {
            on_sent: Some(Arc::new(move || {
                sent_total.inc();
                sent.fetch_add(1, Ordering::Relaxed);
            })),
            on_retry: Some(Arc::new(move || {
                retry_total.inc();
                retried.fetch_add(1, Ordering::Relaxed);
            })),
            on_response: Some(Arc::new(move |elapsed: Duration| {
                packet_duration.observe(elapsed.as_secs_f64());
            })),
        }
    }
}

/// Holds `snmp_request_in_flight` up for as long as it lives, including
/// when the scrape future is dropped half way.
struct InFlight<'a>(&'a IntGauge);

impl<'a> InFlight<'a> {
    fn enter(gauge: &'a IntGauge) -> Self {
        gauge.inc();
        Self(gauge)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.dec();
    }
}

/// Send one sample, giving up if the sink is gone or the scrape is cancelled
/// while the sink is full.
async fn emit(sink: &mpsc::Sender<Sample>, cancel: &CancellationToken, sample: Sample) -> bool {
    tokio::select! {
        biased;
        sent = sink.send(sample) => sent.is_ok(),
        _ = cancel.cancelled() => false,
    }
}
