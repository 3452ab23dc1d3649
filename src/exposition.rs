//! Conversion of samples into Prometheus metric families.
//!
//! Samples of one name are grouped into a family carrying the help text and
//! type of the first sample seen. Invalid samples, samples whose type
//! disagrees with their family, and repeated label sets are reported back
//! as error strings instead of being encoded.

use crate::error::{Error, Result};
use crate::sample::{Sample, ValueType};
use prometheus::Encoder;
use prometheus::proto::{self, MetricFamily};
use std::collections::{BTreeMap, HashSet};

/// Group `samples` into metric families sorted by name.
///
/// Returns the families and one message per sample that was left out.
///
/// ```
/// use snmp_exporter::exposition::to_metric_families;
/// use snmp_exporter::sample::{Sample, ValueType};
///
/// let samples = vec![
///     Sample::new("ifMtu", "MTU", ValueType::Gauge, 1500.0, vec![("ifIndex".into(), "1".into())]).unwrap(),
///     Sample::new("ifMtu", "MTU", ValueType::Gauge, 9000.0, vec![("ifIndex".into(), "2".into())]).unwrap(),
///     Sample::invalid("Error scraping target", "timeout"),
/// ];
/// let (families, errors) = to_metric_families(&samples);
/// assert_eq!(families.len(), 1);
/// assert_eq!(families[0].get_metric().len(), 2);
/// assert_eq!(errors.len(), 1);
/// ```
pub fn to_metric_families(samples: &[Sample]) -> (Vec<MetricFamily>, Vec<String>) {
    let mut families: BTreeMap<&str, (MetricFamily, Vec<proto::Metric>)> = BTreeMap::new();
    let mut seen: HashSet<(&str, &[(String, String)])> = HashSet::new();
    let mut errors = Vec::new();

    for sample in samples {
        if let Some(error) = &sample.error {
            errors.push(format!("{}: {error}", sample.help));
            continue;
        }

        let (family, metrics) = families.entry(sample.name.as_str()).or_insert_with(|| {
            let mut family = MetricFamily::default();
            family.set_name(sample.name.clone());
            family.set_help(sample.help.clone());
            family.set_field_type(proto_type(sample.value_type));
            (family, Vec::new())
        });

        if family.get_field_type() != proto_type(sample.value_type) {
            errors.push(format!(
                "collected metric {sample} has type {:?} but its family has {:?}",
                sample.value_type,
                family.get_field_type()
            ));
            continue;
        }
        if !seen.insert((sample.name.as_str(), sample.labels.as_slice())) {
            errors.push(format!(
                "collected metric {sample} was collected before with the same name and label values"
            ));
            continue;
        }

        metrics.push(to_metric(sample));
    }

    let families = families
        .into_values()
        .map(|(mut family, metrics)| {
            family.set_metric(metrics.into());
            family
        })
        .collect();
    (families, errors)
}

/// Render `samples` in the Prometheus text exposition format.
///
/// Samples left out by [`to_metric_families`] are logged at debug level.
pub fn encode_text(samples: &[Sample]) -> Result<String> {
    let (families, errors) = to_metric_families(samples);
    for error in &errors {
        tracing::debug!(target: "snmp_exporter::exposition", { error = %error }, "sample not exposed");
    }

    let mut buf = Vec::new();
    prometheus::TextEncoder::new()
        .encode(&families, &mut buf)
        .map_err(|source| Error::Encode { source }.boxed())?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

fn proto_type(value_type: ValueType) -> proto::MetricType {
    match value_type {
        ValueType::Counter => proto::MetricType::COUNTER,
        ValueType::Gauge => proto::MetricType::GAUGE,
        ValueType::Untyped => proto::MetricType::UNTYPED,
    }
}

fn to_metric(sample: &Sample) -> proto::Metric {
    let labels: Vec<proto::LabelPair> = sample
        .labels
        .iter()
        .map(|(name, value)| {
            let mut pair = proto::LabelPair::default();
            pair.set_name(name.clone());
            pair.set_value(value.clone());
            pair
        })
        .collect();

    let mut metric = proto::Metric::default();
    metric.set_label(labels.into());
    match sample.value_type {
        ValueType::Counter => {
            let mut counter = proto::Counter::default();
            counter.set_value(sample.value);
            metric.set_counter(counter);
        }
        ValueType::Gauge => {
            let mut gauge = proto::Gauge::default();
            gauge.set_value(sample.value);
            metric.set_gauge(gauge);
        }
        ValueType::Untyped => {
            let mut untyped = proto::Untyped::default();
            untyped.set_value(sample.value);
            metric.set_untyped(untyped);
        }
    }
    metric
}
