//! Process-wide operational metrics.
//!
//! The bundle is created once by the caller and handed to every
//! [`Collector`](crate::Collector). All members are cheap clones of shared
//! atomics, so concurrent workers update them without coordination.

use prometheus::{Histogram, HistogramOpts, HistogramVec, IntCounter, IntGauge, Registry};

/// Buckets for single request round trips.
const PACKET_BUCKETS: &[f64] = &[0.0001, 0.0005, 0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0];

#[derive(Debug, Clone)]
pub struct Metrics {
    /// `snmp_packets_total`
    pub packets: IntCounter,
    /// `snmp_packet_retries_total`
    pub retries: IntCounter,
    /// `snmp_request_in_flight`
    pub inflight: IntGauge,
    /// `snmp_unexpected_pdu_type_total`
    pub unexpected_pdu_type: IntCounter,
    /// `snmp_packet_duration_seconds`
    pub packet_duration: Histogram,
    /// `snmp_collection_duration_seconds{module}`
    pub collection_duration: HistogramVec,
}

impl Metrics {
    /// Create the bundle and register every member in `registry`.
    pub fn new(registry: &Registry) -> prometheus::Result<Self> {
        let metrics = Self::unregistered()?;
        registry.register(Box::new(metrics.packets.clone()))?;
        registry.register(Box::new(metrics.retries.clone()))?;
        registry.register(Box::new(metrics.inflight.clone()))?;
        registry.register(Box::new(metrics.unexpected_pdu_type.clone()))?;
        registry.register(Box::new(metrics.packet_duration.clone()))?;
        registry.register(Box::new(metrics.collection_duration.clone()))?;
        Ok(metrics)
    }

    /// Create the bundle without registering it anywhere.
    pub fn unregistered() -> prometheus::Result<Self> {
        Ok(Self {
            packets: IntCounter::new(
                "snmp_packets_total",
                "Number of SNMP packets sent, including retries.",
            )?,
            retries: IntCounter::new(
                "snmp_packet_retries_total",
                "Number of SNMP packet retries.",
            )?,
            inflight: IntGauge::new(
                "snmp_request_in_flight",
                "Current number of SNMP scrapes being requested.",
            )?,
            unexpected_pdu_type: IntCounter::new(
                "snmp_unexpected_pdu_type_total",
                "Unexpected value types in a PDU.",
            )?,
            packet_duration: Histogram::with_opts(
                HistogramOpts::new(
                    "snmp_packet_duration_seconds",
                    "A histogram of latencies for SNMP packets.",
                )
                .buckets(PACKET_BUCKETS.to_vec()),
            )?,
            collection_duration: HistogramVec::new(
                HistogramOpts::new(
                    "snmp_collection_duration_seconds",
                    "Duration of collections by the SNMP exporter",
                ),
                &["module"],
            )?,
        })
    }
}
