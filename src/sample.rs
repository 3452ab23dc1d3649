//! Samples emitted by a scrape.
//!
//! A [`Sample`] is one time series point: name, help, labels, type and
//! value. Failures that must be visible to whoever reads the scrape are
//! emitted as invalid samples named `snmp_error` that carry a message
//! instead of a value.

use prometheus::core::Desc;
use std::collections::HashMap;
use std::fmt;

/// Name of the sample that reports a failure.
pub const ERROR_METRIC: &str = "snmp_error";

/// Label names starting with this are reserved for Prometheus itself.
const RESERVED_LABEL_PREFIX: &str = "__";

/// Prometheus value type of a sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    Counter,
    Gauge,
    Untyped,
}

/// One emitted sample.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub name: String,
    pub help: String,
    /// Label pairs, sorted by name.
    pub labels: Vec<(String, String)>,
    pub value_type: ValueType,
    pub value: f64,
    /// Set on invalid samples; `value` is meaningless then.
    pub error: Option<String>,
}

impl Sample {
    /// A checked sample.
    ///
    /// Fails when the metric name or a label name is not a valid Prometheus
    /// name, or a label name repeats.
    ///
    /// ```
    /// use snmp_exporter::sample::{Sample, ValueType};
    ///
    /// let s = Sample::new("ifMtu", "MTU", ValueType::Gauge, 1500.0, vec![("ifIndex".into(), "2".into())]).unwrap();
    /// assert_eq!(s.label("ifIndex"), Some("2"));
    ///
    /// assert!(Sample::new("if-mtu", "", ValueType::Gauge, 1.0, vec![]).is_err());
    /// ```
    pub fn new(
        name: impl Into<String>,
        help: impl Into<String>,
        value_type: ValueType,
        value: f64,
        mut labels: Vec<(String, String)>,
    ) -> std::result::Result<Self, String> {
        let name = name.into();
        let help = help.into();
        labels.sort_by(|a, b| a.0.cmp(&b.0));
        if let Some((label, _)) = labels.iter().find(|(n, _)| n.starts_with(RESERVED_LABEL_PREFIX)) {
            return Err(format!("{label:?} is a reserved label name for metric {name:?}"));
        }
        // Desc refuses an empty help, which is legal for a sample.
        let desc_help = if help.is_empty() { name.clone() } else { help.clone() };
        let label_names = labels.iter().map(|(n, _)| n.clone()).collect();
        Desc::new(name.clone(), desc_help, label_names, HashMap::new())
            .map_err(|e| match e {
                prometheus::Error::Msg(msg) => format!("metric {name:?}: {msg}"),
                other => format!("metric {name:?}: {other}"),
            })?;
        Ok(Self {
            name,
            help,
            labels,
            value_type,
            value,
            error: None,
        })
    }

    /// A gauge whose name and labels are known to be valid.
    pub(crate) fn gauge(name: &str, help: &str, value: f64, labels: Vec<(String, String)>) -> Self {
        Self {
            name: name.to_string(),
            help: help.to_string(),
            labels,
            value_type: ValueType::Gauge,
            value,
            error: None,
        }
    }

    /// An `snmp_error` sample.
    pub fn invalid(help: impl Into<String>, error: impl fmt::Display) -> Self {
        Self {
            name: ERROR_METRIC.to_string(),
            help: help.into(),
            labels: Vec::new(),
            value_type: ValueType::Untyped,
            value: 0.0,
            error: Some(error.to_string()),
        }
    }

    /// Attach a label to an invalid sample.
    pub(crate) fn with_label(mut self, name: &str, value: &str) -> Self {
        self.labels.push((name.to_string(), value.to_string()));
        self.labels.sort_by(|a, b| a.0.cmp(&b.0));
        self
    }

    pub fn is_valid(&self) -> bool {
        self.error.is_none()
    }

    /// Value of label `name`.
    pub fn label(&self, name: &str) -> Option<&str> {
        self.labels
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

impl fmt::Display for Sample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if !self.labels.is_empty() {
            f.write_str("{")?;
            for (i, (name, value)) in self.labels.iter().enumerate() {
                if i > 0 {
                    f.write_str(",")?;
                }
                write!(f, "{name}={value:?}")?;
            }
            f.write_str("}")?;
        }
        match &self.error {
            Some(error) => write!(f, " error: {error}"),
            None => write!(f, " {}", self.value),
        }
    }
}
