//! Metric, index and lookup definitions.
//!
//! These records are produced by the config generator from MIB definitions;
//! the scrape core only reads them.

use crate::error::{Error, Result};
use crate::format::display_hint::FormatOp;
use crate::oid::Oid;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Enum value labels, keyed by the integer the agent reports.
pub type EnumValues = BTreeMap<i64, String>;

/// How an index (or a string-valued PDU) is decoded into text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IndexType {
    Integer,
    Integer32,
    #[serde(rename = "gauge")]
    Gauge,
    #[serde(rename = "counter")]
    Counter,
    PhysAddress48,
    OctetString,
    DisplayString,
    /// Octet string rendered through the entry's `format_spec`.
    DisplayHint,
    InetAddressIPv4,
    InetAddressIPv6,
    /// Discriminator, size, then address bytes.
    InetAddress,
    /// Discriminator, then address bytes without a size.
    InetAddressMissingSize,
    /// IEEE 802.1AB port id: discriminator, size, then bytes.
    LldpPortId,
    EnumAsInfo,
}

impl IndexType {
    /// Whether this type is a family whose concrete type depends on a discriminator.
    pub fn is_discriminated(self) -> bool {
        matches!(
            self,
            IndexType::InetAddress | IndexType::InetAddressMissingSize | IndexType::LldpPortId
        )
    }

    /// Concrete type selected by `discriminator` for a discriminated family.
    ///
    /// ```
    /// use snmp_exporter::config::IndexType;
    ///
    /// assert_eq!(IndexType::InetAddress.resolve(2), Some(IndexType::InetAddressIPv6));
    /// assert_eq!(IndexType::LldpPortId.resolve(3), Some(IndexType::PhysAddress48));
    /// assert_eq!(IndexType::LldpPortId.resolve(4), None);
    /// assert_eq!(IndexType::OctetString.resolve(1), None);
    /// ```
    pub fn resolve(self, discriminator: i64) -> Option<IndexType> {
        match self {
            IndexType::InetAddress | IndexType::InetAddressMissingSize => match discriminator {
                1 => Some(IndexType::InetAddressIPv4),
                2 => Some(IndexType::InetAddressIPv6),
                _ => None,
            },
            IndexType::LldpPortId => match discriminator {
                1 | 2 | 5 | 7 => Some(IndexType::DisplayString),
                3 => Some(IndexType::PhysAddress48),
                _ => None,
            },
            _ => None,
        }
    }

    /// Whether the type reads an explicit size arc unless fixed-size or implied.
    pub(crate) fn is_sized(self) -> bool {
        matches!(
            self,
            IndexType::OctetString | IndexType::DisplayString | IndexType::DisplayHint
        )
    }
}

impl fmt::Display for IndexType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IndexType::Integer => "Integer",
            IndexType::Integer32 => "Integer32",
            IndexType::Gauge => "gauge",
            IndexType::Counter => "counter",
            IndexType::PhysAddress48 => "PhysAddress48",
            IndexType::OctetString => "OctetString",
            IndexType::DisplayString => "DisplayString",
            IndexType::DisplayHint => "DisplayHint",
            IndexType::InetAddressIPv4 => "InetAddressIPv4",
            IndexType::InetAddressIPv6 => "InetAddressIPv6",
            IndexType::InetAddress => "InetAddress",
            IndexType::InetAddressMissingSize => "InetAddressMissingSize",
            IndexType::LldpPortId => "LldpPortId",
            IndexType::EnumAsInfo => "EnumAsInfo",
        };
        f.write_str(name)
    }
}

/// What kind of samples a metric produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MetricType {
    #[serde(rename = "counter")]
    Counter,
    #[serde(rename = "gauge")]
    Gauge,
    Float,
    Double,
    DateAndTime,
    ParseDateAndTime,
    NTPTimeStamp,
    EnumAsInfo,
    EnumAsStateSet,
    Bits,
    OctetString,
    DisplayString,
    DisplayHint,
    PhysAddress48,
    InetAddressIPv4,
    InetAddressIPv6,
    InetAddress,
    InetAddressMissingSize,
    LldpPortId,
}

impl MetricType {
    /// Text decoding used when the metric's value is emitted as a label.
    ///
    /// `None` for the numeric and specially handled kinds.
    pub fn text_type(self) -> Option<IndexType> {
        match self {
            MetricType::OctetString => Some(IndexType::OctetString),
            MetricType::DisplayString => Some(IndexType::DisplayString),
            MetricType::DisplayHint => Some(IndexType::DisplayHint),
            MetricType::PhysAddress48 => Some(IndexType::PhysAddress48),
            MetricType::InetAddressIPv4 => Some(IndexType::InetAddressIPv4),
            MetricType::InetAddressIPv6 => Some(IndexType::InetAddressIPv6),
            MetricType::InetAddress => Some(IndexType::InetAddress),
            MetricType::InetAddressMissingSize => Some(IndexType::InetAddressMissingSize),
            MetricType::LldpPortId => Some(IndexType::LldpPortId),
            _ => None,
        }
    }
}

/// A regular expression that round-trips through the configuration as text.
///
/// Patterns read from configuration are anchored: `foo` matches only the
/// whole string `foo`.
#[derive(Clone)]
pub struct Regexp {
    regex: regex::Regex,
    source: String,
}

impl Regexp {
    /// Compile `pattern` anchored at both ends.
    pub fn new(pattern: &str) -> Result<Self> {
        let regex = regex::Regex::new(&format!("^(?:{pattern})$"))
            .map_err(|e| Error::config(format!("invalid regex {pattern:?}: {e}")))?;
        Ok(Self {
            regex,
            source: pattern.to_string(),
        })
    }

    /// The pattern as written in the configuration.
    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl std::ops::Deref for Regexp {
    type Target = regex::Regex;

    fn deref(&self) -> &regex::Regex {
        &self.regex
    }
}

/// Wrap an already compiled expression as-is, without anchoring.
impl From<regex::Regex> for Regexp {
    fn from(regex: regex::Regex) -> Self {
        let source = regex.as_str().to_string();
        Self { regex, source }
    }
}

impl PartialEq for Regexp {
    fn eq(&self, other: &Self) -> bool {
        self.regex.as_str() == other.regex.as_str()
    }
}

impl fmt::Debug for Regexp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Regexp({:?})", self.source)
    }
}

impl Serialize for Regexp {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.source)
    }
}

impl<'de> Deserialize<'de> for Regexp {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Regexp::new(&s).map_err(serde::de::Error::custom)
    }
}

fn default_extract_value() -> String {
    "$1".to_string()
}

/// One pattern of a regex extract group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegexpExtract {
    /// Template expanded with the capture groups, then parsed as a float.
    #[serde(default = "default_extract_value")]
    pub value: String,
    pub regex: Regexp,
}

impl RegexpExtract {
    pub fn new(regex: impl Into<Regexp>, value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            regex: regex.into(),
        }
    }
}

fn is_zero(v: &f64) -> bool {
    *v == 0.0
}

fn is_false(v: &bool) -> bool {
    !*v
}

fn is_zero_usize(v: &usize) -> bool {
    *v == 0
}

/// A metric definition: the base OID of a scalar or table column and how to
/// turn each instance under it into samples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Metric {
    pub name: String,
    pub oid: Oid,
    #[serde(rename = "type")]
    pub metric_type: MetricType,
    #[serde(default)]
    pub help: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub indexes: Vec<Index>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub lookups: Vec<Lookup>,
    /// Extra gauges extracted from the string value, keyed by name suffix.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub regex_extracts: BTreeMap<String, Vec<RegexpExtract>>,
    /// strftime-style pattern for `ParseDateAndTime`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub datetime_pattern: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub enum_values: EnumValues,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub offset: f64,
    /// Multiplier applied before `offset`; 0 means unset.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub scale: f64,
    /// Parsed DISPLAY-HINT for `DisplayHint` values.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub format_spec: Vec<FormatOp>,
}

impl Metric {
    /// A bare metric with no indexes, lookups or transforms.
    pub fn new(name: impl Into<String>, oid: Oid, metric_type: MetricType) -> Self {
        Self {
            name: name.into(),
            oid,
            metric_type,
            help: String::new(),
            indexes: Vec::new(),
            lookups: Vec::new(),
            regex_extracts: BTreeMap::new(),
            datetime_pattern: String::new(),
            enum_values: EnumValues::new(),
            offset: 0.0,
            scale: 0.0,
            format_spec: Vec::new(),
        }
    }

    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = help.into();
        self
    }

    pub fn index(mut self, index: Index) -> Self {
        self.indexes.push(index);
        self
    }

    pub fn lookup(mut self, lookup: Lookup) -> Self {
        self.lookups.push(lookup);
        self
    }

    pub fn enum_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = (i64, S)>,
        S: Into<String>,
    {
        self.enum_values = values.into_iter().map(|(k, v)| (k, v.into())).collect();
        self
    }
}

/// One component of a table index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Index {
    pub labelname: String,
    #[serde(rename = "type")]
    pub index_type: IndexType,
    /// Length in sub-identifiers for fixed-size strings; 0 reads a size arc.
    #[serde(default, skip_serializing_if = "is_zero_usize")]
    pub fixed_size: usize,
    /// Last index without a size arc: consumes everything that remains.
    #[serde(default, skip_serializing_if = "is_false")]
    pub implied: bool,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub enum_values: EnumValues,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub format_spec: Vec<FormatOp>,
}

impl Index {
    pub fn new(labelname: impl Into<String>, index_type: IndexType) -> Self {
        Self {
            labelname: labelname.into(),
            index_type,
            fixed_size: 0,
            implied: false,
            enum_values: EnumValues::new(),
            format_spec: Vec::new(),
        }
    }

    pub fn fixed_size(mut self, size: usize) -> Self {
        self.fixed_size = size;
        self
    }

    pub fn implied(mut self) -> Self {
        self.implied = true;
        self
    }
}

/// Replace or add a label by reading another PDU keyed by decoded indexes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Lookup {
    /// Index labels whose sub-identifiers are appended to `oid`. Empty
    /// means "drop `labelname`".
    #[serde(default)]
    pub labels: Vec<String>,
    pub labelname: String,
    #[serde(default, skip_serializing_if = "Oid::is_empty")]
    pub oid: Oid,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub lookup_type: Option<IndexType>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub format_spec: Vec<FormatOp>,
}

impl Lookup {
    pub fn new<I, S>(labels: I, labelname: impl Into<String>, oid: Oid) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            labels: labels.into_iter().map(Into::into).collect(),
            labelname: labelname.into(),
            oid,
            lookup_type: None,
            format_spec: Vec::new(),
        }
    }

    /// A lookup that removes `labelname` from the output.
    pub fn drop_label(labelname: impl Into<String>) -> Self {
        Self::new(Vec::<String>::new(), labelname, Oid::default())
    }

    pub fn with_type(mut self, lookup_type: IndexType) -> Self {
        self.lookup_type = Some(lookup_type);
        self
    }
}
