//! Sample building: turning scraped PDUs into samples.
//!
//! Every PDU is matched to its metric definition through the
//! [`MetricTree`]. The OID suffix past the metric's base is decoded into
//! index labels, lookups rewrite or add labels by reading other PDUs of
//! the same scrape, and the metric type decides how many samples the PDU
//! yields and with which values.
//!
//! Failures that concern a single PDU (an undecodable date, a label set
//! that does not form a valid series) never abort the scrape: the PDU is
//! dropped with a debug log, or reported as an `snmp_error` sample.

use crate::config::{IndexType, Metric, MetricType};
use crate::error::{Error, Result};
use crate::format::{self, time};
use crate::index::{self, Layout};
use crate::metrics::Metrics;
use crate::oid::Oid;
use crate::pdu::Pdu;
use crate::sample::{Sample, ValueType};
use crate::tree::MetricTree;
use crate::value::Value;
use std::collections::{BTreeMap, HashMap};

const LOG_TARGET: &str = "snmp_exporter::samples";

/// Builds samples from the PDUs of one module scrape.
///
/// Holds the PDUs keyed by name so lookups can find related values. When
/// two PDUs share a name the later one is kept.
pub struct SampleBuilder<'a> {
    pdus: HashMap<&'a Oid, &'a Pdu>,
    metrics: &'a Metrics,
    wrap_counters: bool,
}

impl<'a> SampleBuilder<'a> {
    pub fn new(pdus: &'a [Pdu], metrics: &'a Metrics, wrap_counters: bool) -> Self {
        let mut by_name = HashMap::with_capacity(pdus.len());
        for pdu in pdus {
            by_name.insert(&pdu.name, pdu);
        }
        Self {
            pdus: by_name,
            metrics,
            wrap_counters,
        }
    }

    /// Number of distinct PDU names.
    pub fn len(&self) -> usize {
        self.pdus.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pdus.is_empty()
    }

    /// Samples for every PDU that belongs to one of `definitions`.
    ///
    /// PDUs outside all metric subtrees are ignored. Sample order is
    /// unspecified.
    pub fn build(&self, definitions: &[Metric]) -> Vec<Sample> {
        let tree = MetricTree::new(definitions);
        let mut samples = Vec::new();
        for (name, pdu) in &self.pdus {
            if let Some((metric, index)) = tree.lookup(name.arcs()) {
                samples.extend(self.pdu_to_samples(index, pdu, metric));
            }
        }
        samples
    }

    /// Decode index labels from `index_oids` and apply the metric's lookups.
    pub fn indexes_to_labels(&self, index_oids: &[u32], metric: &Metric) -> BTreeMap<String, String> {
        let mut labels = BTreeMap::new();
        let mut label_oids: HashMap<&str, Vec<u32>> = HashMap::new();

        let mut rest = index_oids.to_vec();
        for index in &metric.indexes {
            let decoded = index::decode(&rest, &Layout::from(index));
            labels.insert(index.labelname.clone(), decoded.text);
            label_oids.insert(index.labelname.as_str(), decoded.used);
            rest = decoded.remaining;
        }

        for lookup in &metric.lookups {
            if lookup.labels.is_empty() {
                labels.remove(&lookup.labelname);
                continue;
            }

            let mut suffix = Vec::new();
            let mut complete = true;
            for label in &lookup.labels {
                match label_oids.get(label.as_str()) {
                    Some(arcs) => suffix.extend_from_slice(arcs),
                    None => complete = false,
                }
            }
            let found = if complete {
                self.pdus.get(&lookup.oid.with_suffix(&suffix))
            } else {
                None
            };

            match found {
                Some(pdu) => {
                    let mut lookup_type = lookup.lookup_type;
                    if let Some(family) = lookup_type
                        && family.is_discriminated()
                        && let Some(disc) = self.pdus.get(&lookup.oid.prev_sibling().with_suffix(&suffix))
                        && let Some(concrete) = family.resolve(disc.value.as_index_int())
                    {
                        lookup_type = Some(concrete);
                    }
                    let text = format::as_string(&pdu.value, lookup_type, &lookup.format_spec, self.metrics);
                    labels.insert(lookup.labelname.clone(), text);
                    label_oids.insert(lookup.labelname.as_str(), vec![index_arc(&pdu.value)]);
                }
                None => {
                    labels.insert(lookup.labelname.clone(), String::new());
                }
            }
        }

        labels
    }

    /// Samples for one PDU of `metric` whose OID ends in `index_oids`.
    pub fn pdu_to_samples(&self, index_oids: &[u32], pdu: &Pdu, metric: &Metric) -> Vec<Sample> {
        let labels = self.indexes_to_labels(index_oids, metric);
        let mut pairs: Vec<(String, String)> =
            labels.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        let mut value = format::as_float(&pdu.value, self.wrap_counters);

        let value_type = match metric.metric_type {
            MetricType::Counter => ValueType::Counter,
            MetricType::Gauge | MetricType::Float | MetricType::Double => ValueType::Gauge,
            MetricType::DateAndTime => {
                let Some(v) = parsed(metric, "DateAndTime", time::date_and_time(&pdu.value)) else {
                    return Vec::new();
                };
                value = v;
                ValueType::Gauge
            }
            MetricType::ParseDateAndTime => {
                let text = format::as_string(&pdu.value, Some(IndexType::DisplayString), &[], self.metrics);
                let parsed_time = time::parse_with_pattern(&text, &metric.datetime_pattern);
                let Some(v) = parsed(metric, "ParseDateAndTime", parsed_time) else {
                    return Vec::new();
                };
                value = v;
                ValueType::Gauge
            }
            MetricType::NTPTimeStamp => {
                let Some(v) = parsed(metric, "NTPTimeStamp", time::ntp_timestamp(&pdu.value)) else {
                    return Vec::new();
                };
                value = v;
                ValueType::Gauge
            }
            MetricType::EnumAsInfo => return enum_as_info(metric, value as i64, pairs),
            MetricType::EnumAsStateSet => return enum_as_state_set(metric, value as i64, pairs),
            MetricType::Bits => return bits(metric, &pdu.value, pairs),
            MetricType::OctetString
            | MetricType::DisplayString
            | MetricType::DisplayHint
            | MetricType::PhysAddress48
            | MetricType::InetAddressIPv4
            | MetricType::InetAddressIPv6
            | MetricType::InetAddress
            | MetricType::InetAddressMissingSize
            | MetricType::LldpPortId => {
                value = 1.0;
                let text_type = self.text_type(metric, index_oids);
                let text = format::as_string(&pdu.value, Some(text_type), &metric.format_spec, self.metrics);
                if !metric.regex_extracts.is_empty() {
                    return regex_extracts(metric, &text, pairs);
                }
                // An index label of the same name already carries the value.
                if !labels.contains_key(&metric.name) {
                    pairs.push((metric.name.clone(), text));
                }
                ValueType::Gauge
            }
        };

        if metric.scale != 0.0 {
            value *= metric.scale;
        }
        value += metric.offset;

        let label_values: Vec<String> = pairs.iter().map(|(_, v)| v.clone()).collect();
        match Sample::new(&metric.name, &metric.help, value_type, value, pairs) {
            Ok(sample) => vec![sample],
            Err(e) => vec![Sample::invalid(
                "Error calling NewConstMetric",
                format!(
                    "error for metric {} with labels {label_values:?} from indexOids {index_oids:?}: {e}",
                    metric.name
                ),
            )],
        }
    }

    /// Concrete text decoding for a string-valued metric.
    ///
    /// Discriminated families read their discriminator from the previous
    /// column of the same row and fall back to `OctetString`.
    fn text_type(&self, metric: &Metric, index_oids: &[u32]) -> IndexType {
        let declared = metric.metric_type.text_type().unwrap_or(IndexType::OctetString);
        if !declared.is_discriminated() {
            return declared;
        }
        let prev = metric.oid.prev_sibling().with_suffix(index_oids);
        match self.pdus.get(&prev) {
            Some(disc) => {
                let value = disc.value.as_index_int();
                declared.resolve(value).unwrap_or_else(|| {
                    tracing::debug!(target: LOG_TARGET, { value, oid = %prev, metric = %metric.name }, "unable to handle type value");
                    IndexType::OctetString
                })
            }
            None => {
                tracing::debug!(target: LOG_TARGET, { oid = %prev, metric = %metric.name }, "unable to find type at oid for metric");
                IndexType::OctetString
            }
        }
    }
}

/// Build samples for `definitions` from `pdus`.
///
/// ```
/// use snmp_exporter::config::{Index, IndexType, Metric, MetricType};
/// use snmp_exporter::samples::build_samples;
/// use snmp_exporter::{oid, Metrics, Pdu, Value};
///
/// let metrics = Metrics::unregistered().unwrap();
/// let definitions = vec![Metric::new("ifMtu", oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 4), MetricType::Gauge)
///     .index(Index::new("ifIndex", IndexType::Gauge))];
/// let pdus = vec![Pdu::new(oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 4, 3), Value::Integer(1500))];
///
/// let samples = build_samples(&pdus, &definitions, &metrics, true);
/// assert_eq!(samples.len(), 1);
/// assert_eq!(samples[0].value, 1500.0);
/// assert_eq!(samples[0].label("ifIndex"), Some("3"));
/// ```
pub fn build_samples(pdus: &[Pdu], definitions: &[Metric], metrics: &Metrics, wrap_counters: bool) -> Vec<Sample> {
    SampleBuilder::new(pdus, metrics, wrap_counters).build(definitions)
}

/// Arc used when a lookup result keys a chained lookup.
fn index_arc(value: &Value) -> u32 {
    u32::try_from(value.as_index_int()).unwrap_or_default()
}

fn label_values(pairs: &[(String, String)]) -> Vec<&str> {
    pairs.iter().map(|(_, v)| v.as_str()).collect()
}

fn parsed(metric: &Metric, kind: &str, result: Result<f64>) -> Option<f64> {
    match result {
        Ok(v) => Some(v),
        Err(e) => {
            tracing::debug!(target: LOG_TARGET, { metric = %metric.name, error = %e }, "error parsing {kind}");
            None
        }
    }
}

fn checked(
    name: &str,
    help: String,
    value: f64,
    pairs: Vec<(String, String)>,
    kind: &str,
    metric: &Metric,
) -> Sample {
    let label_values: Vec<String> = pairs.iter().map(|(_, v)| v.clone()).collect();
    Sample::new(name, help, ValueType::Gauge, value, pairs).unwrap_or_else(|e| {
        Sample::invalid(
            format!("Error calling NewConstMetric for {kind}"),
            format!("error for metric {} with labels {label_values:?}: {e}", metric.name),
        )
    })
}

fn with_label(pairs: &[(String, String)], name: &str, value: &str) -> Vec<(String, String)> {
    let mut out = pairs.to_vec();
    out.push((name.to_string(), value.to_string()));
    out
}

fn enum_as_info(metric: &Metric, value: i64, pairs: Vec<(String, String)>) -> Vec<Sample> {
    let state = metric
        .enum_values
        .get(&value)
        .cloned()
        .unwrap_or_else(|| value.to_string());
    vec![checked(
        &format!("{}_info", metric.name),
        format!("{} (EnumAsInfo)", metric.help),
        1.0,
        with_label(&pairs, &metric.name, &state),
        "EnumAsInfo",
        metric,
    )]
}

/// The current state first with value 1, then every other state with 0.
fn enum_as_state_set(metric: &Metric, value: i64, pairs: Vec<(String, String)>) -> Vec<Sample> {
    let help = format!("{} (EnumAsStateSet)", metric.help);
    let current = metric
        .enum_values
        .get(&value)
        .cloned()
        .unwrap_or_else(|| value.to_string());

    let mut samples = vec![checked(
        &metric.name,
        help.clone(),
        1.0,
        with_label(&pairs, &metric.name, &current),
        "EnumAsStateSet",
        metric,
    )];
    for (k, state) in &metric.enum_values {
        if *k == value {
            continue;
        }
        samples.push(checked(
            &metric.name,
            help.clone(),
            0.0,
            with_label(&pairs, &metric.name, state),
            "EnumAsStateSet",
            metric,
        ));
    }
    samples
}

/// One sample per enum entry; bit 0 is the most significant bit of the first byte.
fn bits(metric: &Metric, value: &Value, pairs: Vec<(String, String)>) -> Vec<Sample> {
    let Some(bytes) = value.as_bytes() else {
        let err = Error::BitsNotBytes {
            metric: metric.name.as_str().into(),
        };
        return vec![Sample::invalid(
            "BITS type was not a BITSTRING on the wire.",
            format!("{err} with labels {:?}: {}", label_values(&pairs), value.type_name()),
        )];
    };

    let help = format!("{} (Bits)", metric.help);
    metric
        .enum_values
        .iter()
        .map(|(k, name)| {
            let set = usize::try_from(*k)
                .ok()
                .filter(|bit| *bit < bytes.len() * 8)
                .is_some_and(|bit| bytes[bit / 8] & (0x80 >> (bit % 8)) != 0);
            checked(
                &metric.name,
                help.clone(),
                if set { 1.0 } else { 0.0 },
                with_label(&pairs, &metric.name, name),
                "Bits",
                metric,
            )
        })
        .collect()
}

/// One gauge per extract group, from the first pattern that matches and
/// expands to a number.
fn regex_extracts(metric: &Metric, text: &str, pairs: Vec<(String, String)>) -> Vec<Sample> {
    let help = format!("{} (regex extracted)", metric.help);
    let mut samples = Vec::new();
    for (suffix, extracts) in &metric.regex_extracts {
        for extract in extracts {
            let Some(captures) = extract.regex.captures(text) else {
                tracing::debug!(target: LOG_TARGET, { metric = %metric.name, pattern = %extract.regex.as_str(), value = %text }, "no match found for regexp");
                continue;
            };
            let mut expanded = String::new();
            captures.expand(&extract.value, &mut expanded);
            let value = match expanded.parse::<f64>() {
                Ok(v) => v,
                Err(e) => {
                    tracing::debug!(target: LOG_TARGET, { metric = %metric.name, value = %expanded, error = %e }, "error parsing float64 from value");
                    continue;
                }
            };
            samples.push(checked(
                &format!("{}{suffix}", metric.name),
                help.clone(),
                value,
                pairs.clone(),
                "regex_extract",
                metric,
            ));
            break;
        }
    }
    samples
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Index, Lookup, RegexpExtract};
    use crate::format::display_hint::{FormatOp, HintFormat};
    use crate::oid;
    use regex::Regex;

    fn metrics() -> Metrics {
        Metrics::unregistered().unwrap()
    }

    fn labels(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    fn metric(metric_type: MetricType) -> Metric {
        Metric::new("test_metric", oid!(1, 1, 1, 1, 1), metric_type).help("Help string")
    }

    /// Samples of a single PDU with no other PDUs in the scrape.
    fn samples(value: impl Into<Value>, metric: &Metric) -> Vec<Sample> {
        samples_with(value, &[], metric, &[])
    }

    fn samples_with(value: impl Into<Value>, index_oids: &[u32], metric: &Metric, others: &[Pdu]) -> Vec<Sample> {
        let m = metrics();
        let pdu = Pdu::new(metric.oid.with_suffix(index_oids), value);
        SampleBuilder::new(others, &m, true).pdu_to_samples(index_oids, &pdu, metric)
    }

    fn to_labels(index_oids: &[u32], metric: &Metric, pdus: &[Pdu]) -> BTreeMap<String, String> {
        let m = metrics();
        SampleBuilder::new(pdus, &m, true).indexes_to_labels(index_oids, metric)
    }

    fn unanchored(extracts: &[(&str, &str)]) -> Vec<RegexpExtract> {
        extracts
            .iter()
            .map(|(re, value)| RegexpExtract::new(Regex::new(re).unwrap(), *value))
            .collect()
    }

    fn dotted_quad() -> Vec<FormatOp> {
        vec![
            FormatOp::new(1, HintFormat::Decimal).sep('.'),
            FormatOp::new(1, HintFormat::Decimal).sep('.'),
            FormatOp::new(1, HintFormat::Decimal).sep('.'),
            FormatOp::new(1, HintFormat::Decimal),
        ]
    }

    // ========================================================================
    // Numeric metrics
    // ========================================================================

    #[test]
    fn counter_and_gauge() {
        let s = samples(2, &metric(MetricType::Counter));
        assert_eq!(s.len(), 1);
        assert_eq!(s[0].value_type, ValueType::Counter);
        assert_eq!(s[0].value, 2.0);
        assert!(s[0].labels.is_empty());

        let s = samples(2, &metric(MetricType::Gauge));
        assert_eq!(s[0].value_type, ValueType::Gauge);
    }

    #[test]
    fn scale_then_offset() {
        let mut m = metric(MetricType::Gauge);
        m.scale = 0.1;
        assert!((samples(420, &m)[0].value - 42.0).abs() < 1e-9);

        let mut m = metric(MetricType::Gauge);
        m.offset = -1.0;
        assert_eq!(samples(70, &m)[0].value, 69.0);

        let mut m = metric(MetricType::Gauge);
        m.offset = 2.0;
        m.scale = -1.0;
        assert_eq!(samples(2, &m)[0].value, 0.0);
    }

    #[test]
    fn opaque_floats() {
        assert_eq!(samples(Value::OpaqueFloat(3.0), &metric(MetricType::Float))[0].value, 3.0);
        assert_eq!(samples(Value::OpaqueDouble(3.0), &metric(MetricType::Double))[0].value, 3.0);
    }

    #[test]
    fn counter64_wrap_follows_builder() {
        let m = metrics();
        let def = metric(MetricType::Counter);
        let pdu = Pdu::new(oid!(1, 1, 1, 1, 1), Value::Counter64(19007199254740992));
        let wrapped = SampleBuilder::new(&[], &m, true).pdu_to_samples(&[], &pdu, &def);
        let raw = SampleBuilder::new(&[], &m, false).pdu_to_samples(&[], &pdu, &def);
        assert_eq!(wrapped[0].value, 992800745259008.0);
        assert_eq!(raw[0].value, 19007199254740992.0);
    }

    // ========================================================================
    // Time metrics
    // ========================================================================

    #[test]
    fn date_and_time_metric() {
        let v = Value::from(vec![0x07, 0xE2, 0x08, 0x0F, 0x08, 0x01, 0x0F, 0x00]);
        let s = samples(v, &metric(MetricType::DateAndTime));
        assert_eq!(s[0].value, 1534320075.0);
        assert_eq!(s[0].value_type, ValueType::Gauge);
    }

    #[test]
    fn bad_date_drops_sample() {
        assert!(samples(Value::from(vec![0]), &metric(MetricType::DateAndTime)).is_empty());
        assert!(samples(Value::from(vec![1, 2, 3]), &metric(MetricType::NTPTimeStamp)).is_empty());
    }

    #[test]
    fn parse_date_and_time_metric() {
        let mut m = metric(MetricType::ParseDateAndTime);
        m.datetime_pattern = "%b %d %Y".into();
        assert_eq!(samples("Apr 01 2025", &m)[0].value, 1743465600.0);
        assert!(samples("ABC", &m).is_empty());
    }

    #[test]
    fn ntp_metric() {
        let v = Value::from(vec![235, 6, 119, 246, 48, 209, 11, 59]);
        assert_eq!(samples(v, &metric(MetricType::NTPTimeStamp))[0].value, 1734080886.0);
    }

    // ========================================================================
    // Enums and bits
    // ========================================================================

    fn enums(m: Metric) -> Metric {
        m.enum_values([(0, "foo"), (1, "bar"), (2, "baz")])
    }

    #[test]
    fn enum_as_info_known_and_unknown() {
        let m = enums(metric(MetricType::EnumAsInfo));
        let s = samples(2, &m);
        assert_eq!(s.len(), 1);
        assert_eq!(s[0].name, "test_metric_info");
        assert_eq!(s[0].help, "Help string (EnumAsInfo)");
        assert_eq!(s[0].label("test_metric"), Some("baz"));
        assert_eq!(s[0].value, 1.0);

        let s = samples(3, &m);
        assert_eq!(s[0].label("test_metric"), Some("3"));
    }

    #[test]
    fn enum_as_state_set_known() {
        let s = samples(2, &enums(metric(MetricType::EnumAsStateSet)));
        let got: Vec<(&str, f64)> = s.iter().map(|s| (s.label("test_metric").unwrap(), s.value)).collect();
        assert_eq!(got, vec![("baz", 1.0), ("foo", 0.0), ("bar", 0.0)]);
        assert!(s.iter().all(|s| s.help == "Help string (EnumAsStateSet)"));
    }

    #[test]
    fn enum_as_state_set_unknown_value() {
        let s = samples(3, &enums(metric(MetricType::EnumAsStateSet)));
        let got: Vec<(&str, f64)> = s.iter().map(|s| (s.label("test_metric").unwrap(), s.value)).collect();
        assert_eq!(got, vec![("3", 1.0), ("foo", 0.0), ("bar", 0.0), ("baz", 0.0)]);
    }

    #[test]
    fn bits_msb_first() {
        let m = metric(MetricType::Bits).enum_values([
            (0, "foo"),
            (1, "bar"),
            (2, "baz"),
            (8, "byte2msb"),
            (15, "byte2lsb"),
            (16, "byte3msb"),
            (23, "byte3lsb"),
            (24, "missing"),
        ]);
        let s = samples(Value::from(vec![0b1100_0000, 0b1000_0000, 0b0000_0001]), &m);
        let got: Vec<(&str, f64)> = s.iter().map(|s| (s.label("test_metric").unwrap(), s.value)).collect();
        assert_eq!(
            got,
            vec![
                ("foo", 1.0),
                ("bar", 1.0),
                ("baz", 0.0),
                ("byte2msb", 1.0),
                ("byte2lsb", 0.0),
                ("byte3msb", 0.0),
                ("byte3lsb", 1.0),
                ("missing", 0.0),
            ]
        );
        assert!(s.iter().all(|s| s.help == "Help string (Bits)"));
    }

    #[test]
    fn bits_requires_octets() {
        let m = metric(MetricType::Bits).enum_values([(0, "foo")]);
        let s = samples(5, &m);
        assert_eq!(s.len(), 1);
        assert!(!s[0].is_valid());
        assert_eq!(s[0].name, "snmp_error");
    }

    // ========================================================================
    // String metrics
    // ========================================================================

    #[test]
    fn string_value_becomes_label() {
        let s = samples(-2, &metric(MetricType::DisplayString));
        assert_eq!(s[0].value, 1.0);
        assert_eq!(s[0].label("test_metric"), Some("-2"));

        let s = samples(Value::from(b"router-1".to_vec()), &metric(MetricType::DisplayString));
        assert_eq!(s[0].label("test_metric"), Some("router-1"));

        let s = samples(Value::from(vec![0xDE, 0xAD]), &metric(MetricType::OctetString));
        assert_eq!(s[0].label("test_metric"), Some("0xDEAD"));
    }

    #[test]
    fn string_value_not_duplicated_by_index_label() {
        let m = metric(MetricType::DisplayString).index(Index::new("test_metric", IndexType::Gauge));
        let s = samples_with("ignored", &[7], &m, &[]);
        assert_eq!(s[0].labels, vec![("test_metric".to_string(), "7".to_string())]);
    }

    #[test]
    fn index_label_attached() {
        let m = metric(MetricType::Gauge).index(Index::new("foo", IndexType::DisplayString));
        let s = samples_with(3, &[2, 65, 65], &m, &[]);
        assert_eq!(s[0].label("foo"), Some("AA"));
        assert_eq!(s[0].value, 3.0);
    }

    #[test]
    fn discriminated_value_types() {
        let m = Metric::new("test_metric", oid!(1, 42), MetricType::InetAddress);
        let v4 = Value::from(vec![4, 5, 6, 7]);
        let disc = |v: i32| vec![Pdu::new(oid!(1, 41, 2), v)];

        assert_eq!(samples_with(v4.clone(), &[2], &m, &disc(1))[0].label("test_metric"), Some("4.5.6.7"));
        let v6 = Value::from((4u8..20).collect::<Vec<u8>>());
        assert_eq!(
            samples_with(v6, &[2], &m, &disc(2))[0].label("test_metric"),
            Some("0405:0607:0809:0A0B:0C0D:0E0F:1011:1213")
        );
        // Unknown discriminator or none at all: raw octets.
        assert_eq!(
            samples_with(Value::from(vec![4, 5, 6, 7, 8]), &[2], &m, &disc(3))[0].label("test_metric"),
            Some("0x0405060708")
        );
        assert_eq!(samples_with(v4.clone(), &[2], &m, &[])[0].label("test_metric"), Some("0x04050607"));

        let missing = Metric::new("test_metric", oid!(1, 42), MetricType::InetAddressMissingSize);
        assert_eq!(samples_with(v4, &[2], &missing, &disc(1))[0].label("test_metric"), Some("4.5.6.7"));

        let lldp = Metric::new("test_metric", oid!(1, 42), MetricType::LldpPortId);
        assert_eq!(
            samples_with(Value::from(vec![4, 5, 6, 7, 8, 9]), &[2], &lldp, &disc(3))[0].label("test_metric"),
            Some("04:05:06:07:08:09")
        );
    }

    #[test]
    fn invalid_label_set_reported() {
        let m = Metric::new("bad-name", oid!(1, 1), MetricType::Gauge);
        let s = samples_with(1, &[], &m, &[]);
        assert_eq!(s.len(), 1);
        assert!(!s[0].is_valid());
        assert!(s[0].error.as_deref().unwrap().contains("bad-name"));
    }

    // ========================================================================
    // Regex extracts
    // ========================================================================

    #[test]
    fn regex_extract_constant() {
        let mut m = metric(MetricType::DisplayString);
        m.regex_extracts.insert("Extension".into(), unanchored(&[(".*", "5")]));
        let s = samples("SomeStringValue", &m);
        assert_eq!(s.len(), 1);
        assert_eq!(s[0].name, "test_metricExtension");
        assert_eq!(s[0].help, "Help string (regex extracted)");
        assert_eq!(s[0].value, 5.0);
        assert!(s[0].labels.is_empty());
    }

    #[test]
    fn regex_extract_no_value() {
        let mut m = metric(MetricType::DisplayString);
        m.regex_extracts.insert("Extension".into(), unanchored(&[(".*", "")]));
        assert!(samples("SomeStringValue", &m).is_empty());

        let mut m = metric(MetricType::DisplayString);
        m.regex_extracts.insert("Extension".into(), unanchored(&[("(will_not_match)", "")]));
        assert!(samples("SomeStringValue", &m).is_empty());
    }

    #[test]
    fn regex_extract_groups() {
        let mut m = metric(MetricType::DisplayString);
        m.regex_extracts.insert("Blank".into(), unanchored(&[("^XXXX$", "4")]));
        m.regex_extracts.insert("Extension".into(), unanchored(&[(".*", "5")]));
        m.regex_extracts.insert(
            "MultipleRegexes".into(),
            unanchored(&[("^XXXX$", "123"), ("123.*", "999"), (".*", "777")]),
        );
        m.regex_extracts.insert("Template".into(), unanchored(&[(r"(\d.\d+)", "$1")]));

        let s = samples("Test value 4.42 123 999", &m);
        let got: Vec<(&str, f64)> = s.iter().map(|s| (s.name.as_str(), s.value)).collect();
        assert_eq!(
            got,
            vec![
                ("test_metricExtension", 5.0),
                ("test_metricMultipleRegexes", 999.0),
                ("test_metricTemplate", 4.42),
            ]
        );
    }

    #[test]
    fn regex_extract_after_display_hint() {
        let mut m = metric(MetricType::DisplayHint);
        m.format_spec = dotted_quad();
        m.regex_extracts
            .insert("_last_octet".into(), unanchored(&[(r"192\.168\.1\.(\d+)", "$1")]));
        let s = samples(Value::from(vec![192, 168, 1, 100]), &m);
        assert_eq!(s[0].name, "test_metric_last_octet");
        assert_eq!(s[0].value, 100.0);
    }

    #[test]
    fn regex_extract_on_integer_value() {
        let mut m = metric(MetricType::DisplayString);
        m.regex_extracts.insert("Status".into(), unanchored(&[(".*", "5")]));
        assert_eq!(samples(2, &m)[0].name, "test_metricStatus");
    }

    // ========================================================================
    // Indexes and lookups
    // ========================================================================

    fn bare() -> Metric {
        Metric::new("m", oid!(9), MetricType::Gauge)
    }

    #[test]
    fn no_indexes() {
        assert!(to_labels(&[], &bare(), &[]).is_empty());
    }

    #[test]
    fn integer_index_padded() {
        let m = bare().index(Index::new("l", IndexType::Gauge));
        assert_eq!(to_labels(&[4], &m, &[]), labels(&[("l", "4")]));
        assert_eq!(to_labels(&[], &m, &[]), labels(&[("l", "0")]));
    }

    #[test]
    fn lookup_by_two_indexes() {
        let m = bare()
            .index(Index::new("a", IndexType::Gauge))
            .index(Index::new("b", IndexType::Gauge))
            .lookup(Lookup::new(["a", "b"], "l", oid!(1, 2)));
        let pdus = [Pdu::new(oid!(1, 2, 3, 4), "eth0")];
        assert_eq!(to_labels(&[3, 4], &m, &pdus), labels(&[("a", "3"), ("b", "4"), ("l", "eth0")]));
    }

    #[test]
    fn lookup_replaces_index_label() {
        let m = bare()
            .index(Index::new("l", IndexType::Gauge))
            .lookup(Lookup::new(["l"], "l", oid!(1, 2, 3)));
        let pdus = [Pdu::new(oid!(1, 2, 3, 4), "eth0")];
        assert_eq!(to_labels(&[4], &m, &pdus), labels(&[("l", "eth0")]));
    }

    #[test]
    fn typed_lookups() {
        let lookup = |t: Option<IndexType>| {
            let l = Lookup::new(["l"], "l", oid!(1, 2, 3));
            bare()
                .index(Index::new("l", IndexType::Gauge))
                .lookup(match t {
                    Some(t) => l.with_type(t),
                    None => l,
                })
        };
        let v4 = [Pdu::new(oid!(1, 2, 3, 4), vec![5u8, 6, 7, 8])];
        assert_eq!(to_labels(&[4], &lookup(Some(IndexType::InetAddressIPv4)), &v4), labels(&[("l", "5.6.7.8")]));
        assert_eq!(to_labels(&[4], &lookup(None), &v4), labels(&[("l", "0x05060708")]));

        let v6 = [Pdu::new(oid!(1, 2, 3, 4), (5u8..21).collect::<Vec<u8>>())];
        assert_eq!(
            to_labels(&[4], &lookup(Some(IndexType::InetAddressIPv6)), &v6),
            labels(&[("l", "0506:0708:090A:0B0C:0D0E:0F10:1112:1314")])
        );
    }

    #[test]
    fn lookup_drop_and_miss() {
        let dropped = bare()
            .index(Index::new("l", IndexType::Gauge))
            .lookup(Lookup::drop_label("l"));
        assert!(to_labels(&[4], &dropped, &[]).is_empty());

        let missing = bare()
            .index(Index::new("l", IndexType::Gauge))
            .lookup(Lookup::new(["l"], "l", oid!(1, 2, 3)));
        assert_eq!(to_labels(&[4], &missing, &[]), labels(&[("l", "")]));

        let unknown_label = bare().lookup(Lookup::new(["nope"], "l", oid!(1, 2, 3)));
        assert_eq!(to_labels(&[4], &unknown_label, &[]), labels(&[("l", "")]));
    }

    #[test]
    fn lookup_keyed_by_octet_string_index() {
        let m = bare()
            .index(Index::new("l", IndexType::OctetString))
            .lookup(Lookup::new(["l"], "l", oid!(1)));
        let pdus = [Pdu::new(oid!(1, 3, 65, 32, 255), "octet")];
        assert_eq!(to_labels(&[3, 65, 32, 255], &m, &pdus), labels(&[("l", "octet")]));
    }

    #[test]
    fn chained_lookups() {
        let m = bare()
            .index(Index::new("a", IndexType::Gauge))
            .lookup(Lookup::new(["a"], "chainable_id", oid!(1, 1, 1, 2)))
            .lookup(Lookup::new(["chainable_id"], "targetlabel", oid!(2, 2, 2)));
        for id in [Value::Integer(42), Value::Gauge32(42)] {
            let pdus = [
                Pdu::new(oid!(1, 1, 1, 1, 1), "source_obj0"),
                Pdu::new(oid!(1, 1, 1, 2, 1), id),
                Pdu::new(oid!(2, 2, 2, 42), "targetvalue"),
            ];
            assert_eq!(
                to_labels(&[1, 1, 1, 1], &m, &pdus),
                labels(&[("a", "1"), ("chainable_id", "42"), ("targetlabel", "targetvalue")])
            );
        }
    }

    #[test]
    fn discriminated_lookup() {
        let m = bare()
            .index(Index::new("lldpRemTimeMark", IndexType::Gauge))
            .index(Index::new("lldpRemLocalPortNum", IndexType::Gauge))
            .index(Index::new("lldpRemIndex", IndexType::Gauge))
            .lookup(
                Lookup::new(["lldpRemLocalPortNum"], "lldpLocPortId", oid!(1, 1, 3))
                    .with_type(IndexType::LldpPortId),
            );
        let pdus = [
            Pdu::new(oid!(1, 1, 9, 1, 8, 1), "hostname"),
            Pdu::new(oid!(1, 1, 2, 8), 3),
            Pdu::new(oid!(1, 1, 3, 8), vec![4u8, 5, 6, 7, 8, 9]),
        ];
        assert_eq!(
            to_labels(&[1, 8, 1], &m, &pdus),
            labels(&[
                ("lldpRemTimeMark", "1"),
                ("lldpRemLocalPortNum", "8"),
                ("lldpRemIndex", "1"),
                ("lldpLocPortId", "04:05:06:07:08:09"),
            ])
        );
    }

    #[test]
    fn display_hint_lookup() {
        let mut lookup = Lookup::new(["idx"], "ip_addr", oid!(1, 2, 3)).with_type(IndexType::DisplayHint);
        lookup.format_spec = dotted_quad();
        let m = bare().index(Index::new("idx", IndexType::Gauge)).lookup(lookup);
        let pdus = [Pdu::new(oid!(1, 2, 3, 1), vec![10u8, 0, 0, 1])];
        assert_eq!(to_labels(&[1], &m, &pdus), labels(&[("idx", "1"), ("ip_addr", "10.0.0.1")]));

        let m = bare()
            .index(Index::new("idx", IndexType::Gauge))
            .lookup(Lookup::new(["idx"], "raw_data", oid!(1, 2, 3)).with_type(IndexType::DisplayHint));
        let pdus = [Pdu::new(oid!(1, 2, 3, 1), vec![0xABu8, 0xCD])];
        assert_eq!(to_labels(&[1], &m, &pdus), labels(&[("idx", "1"), ("raw_data", "0xABCD")]));
    }

    // ========================================================================
    // Whole module
    // ========================================================================

    #[test]
    fn build_matches_pdus_to_metrics() {
        let m = metrics();
        let definitions = vec![
            Metric::new("ifDescr", oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 2), MetricType::DisplayString)
                .index(Index::new("ifIndex", IndexType::Gauge)),
            Metric::new("ifInOctets", oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 10), MetricType::Counter)
                .index(Index::new("ifIndex", IndexType::Gauge))
                .lookup(
                    Lookup::new(["ifIndex"], "ifDescr", oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 2))
                        .with_type(IndexType::DisplayString),
                ),
        ];
        let pdus = vec![
            Pdu::new(oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 2, 1), Value::from(b"lo".to_vec())),
            Pdu::new(oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 10, 1), Value::Counter32(1234)),
            // Not covered by any metric.
            Pdu::new(oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 3, 1), 24),
        ];

        let builder = SampleBuilder::new(&pdus, &m, true);
        assert_eq!(builder.len(), 3);
        let mut samples = builder.build(&definitions);
        samples.sort_by(|a, b| a.name.cmp(&b.name));

        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].to_string(), r#"ifDescr{ifDescr="lo",ifIndex="1"} 1"#);
        assert_eq!(samples[1].to_string(), r#"ifInOctets{ifDescr="lo",ifIndex="1"} 1234"#);
    }

    #[test]
    fn duplicate_names_last_wins() {
        let m = metrics();
        let definitions = vec![Metric::new("a", oid!(1, 1), MetricType::Gauge)];
        let pdus = vec![Pdu::new(oid!(1, 1, 0), 1), Pdu::new(oid!(1, 1, 0), 2)];
        let samples = build_samples(&pdus, &definitions, &m, true);
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].value, 2.0);
    }
}
