//! Exporter configuration.
//!
//! The configuration file maps names to [`Auth`] records and [`Module`]s.
//! It is normally produced by the config generator; this crate only loads
//! it, applies defaults and validates it.
//!
//! ```
//! use snmp_exporter::config::Config;
//!
//! let config = Config::from_yaml_str(r#"
//! auths:
//!   public_v2:
//!     community: public
//! modules:
//!   if_mib:
//!     walk: [1.3.6.1.2.1.2.2.1.8]
//!     metrics:
//!       - name: ifOperStatus
//!         oid: 1.3.6.1.2.1.2.2.1.8
//!         type: gauge
//!         indexes:
//!           - labelname: ifIndex
//!             type: gauge
//! "#).unwrap();
//!
//! let module = &config.modules["if_mib"];
//! assert_eq!(module.walk_params.max_repetitions, 25);
//! assert_eq!(module.metrics[0].name, "ifOperStatus");
//! ```

mod auth;
mod metric;

pub use auth::{Auth, AuthProtocol, PrivProtocol, Secret, SecurityLevel};
pub use metric::{
    EnumValues, Index, IndexType, Lookup, Metric, MetricType, Regexp, RegexpExtract,
};

use crate::error::{Error, Result};
use crate::oid::Oid;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

/// Default bulk size and per-get OID cap.
pub const DEFAULT_MAX_REPETITIONS: u32 = 25;
/// Default retries per request.
pub const DEFAULT_RETRIES: u32 = 3;
/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// The whole configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub auths: BTreeMap<String, Auth>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub modules: BTreeMap<String, Module>,
    #[serde(skip_serializing_if = "is_zero")]
    pub version: u32,
}

fn is_zero(v: &u32) -> bool {
    *v == 0
}

impl Config {
    /// Parse and validate a single YAML document.
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(text)
            .map_err(|e| Error::config(format!("error parsing config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load every file matched by `patterns`, in order.
    ///
    /// Each pattern is a glob. Files are merged: a later auth or module
    /// with the same name replaces an earlier one. With `expand_env`,
    /// usernames and passwords have `$VAR` / `${VAR}` references replaced
    /// from the environment.
    pub fn load_files<I, P>(patterns: I, expand_env: bool) -> Result<Self>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<str>,
    {
        let mut config = Config::default();

        for pattern in patterns {
            let pattern = pattern.as_ref();
            let paths = glob::glob(pattern)
                .map_err(|e| Error::config(format!("invalid config path pattern {pattern:?}: {e}")))?;
            for entry in paths {
                let path = entry.map_err(|e| {
                    Error::Io {
                        path: e.path().to_path_buf(),
                        source: e.into_error(),
                    }
                    .boxed()
                })?;
                let file = Self::read_file(&path)?;
                tracing::debug!(target: "snmp_exporter::config", { path = %path.display(), modules = file.modules.len(), auths = file.auths.len() }, "loaded config file");
                config.merge(file);
            }
        }

        if expand_env {
            config.expand_env()?;
        }
        Ok(config)
    }

    fn read_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| {
            Error::Io {
                path: path.to_path_buf(),
                source,
            }
            .boxed()
        })?;
        let config: Config = serde_yaml::from_str(&text).map_err(|source| {
            Error::Yaml {
                path: path.to_path_buf(),
                source,
            }
            .boxed()
        })?;
        config.validate()?;
        Ok(config)
    }

    fn merge(&mut self, other: Config) {
        self.auths.extend(other.auths);
        self.modules.extend(other.modules);
        if other.version != 0 {
            self.version = other.version;
        }
    }

    fn expand_env(&mut self) -> Result<()> {
        for auth in self.auths.values_mut() {
            if !auth.username.is_empty() {
                auth.username = auth::substitute_env(&auth.username)?;
            }
            if !auth.password.is_empty() {
                let password = auth::substitute_env(auth.password.expose())?;
                auth.password.set(password);
            }
            if !auth.priv_password.is_empty() {
                let password = auth::substitute_env(auth.priv_password.expose())?;
                auth.priv_password.set(password);
            }
        }
        Ok(())
    }

    /// Validate every auth record.
    pub fn validate(&self) -> Result<()> {
        for (name, auth) in &self.auths {
            auth.validate()
                .map_err(|e| Error::config(format!("auth {name:?}: {}", config_message(&e))))?;
        }
        Ok(())
    }
}

fn config_message(err: &Error) -> String {
    match err {
        Error::Config { message } => message.to_string(),
        other => other.to_string(),
    }
}

/// Request tuning applied to every operation of a module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WalkParams {
    /// Bulk size for walks; also caps OIDs per get request.
    pub max_repetitions: u32,
    pub retries: u32,
    #[serde(with = "duration")]
    pub timeout: Duration,
    pub use_unconnected_udp_socket: bool,
    pub allow_nonincreasing_oids: bool,
}

impl Default for WalkParams {
    fn default() -> Self {
        Self {
            max_repetitions: DEFAULT_MAX_REPETITIONS,
            retries: DEFAULT_RETRIES,
            timeout: DEFAULT_TIMEOUT,
            use_unconnected_udp_socket: false,
            allow_nonincreasing_oids: false,
        }
    }
}

/// Durations written as `5s`, `500ms`, `1m30s`.
mod duration {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&humantime::format_duration(*d))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let s = String::deserialize(deserializer)?;
        humantime::parse_duration(&s).map_err(serde::de::Error::custom)
    }
}

/// Restrict target columns to the instances whose `oid` value matches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DynamicFilter {
    /// Column walked to evaluate the filter.
    pub oid: Oid,
    /// Columns fetched only for the matching instances.
    #[serde(default)]
    pub targets: Vec<Oid>,
    /// Unanchored regular expressions matched against the string form of each value.
    #[serde(default)]
    pub values: Vec<String>,
}

/// A named set of requests and the metrics built from their results.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "ModuleDef")]
pub struct Module {
    /// Subtree roots to walk.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub walk: Vec<Oid>,
    /// Instance OIDs fetched with point queries.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub get: Vec<Oid>,
    pub metrics: Vec<Metric>,
    #[serde(flatten)]
    pub walk_params: WalkParams,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<DynamicFilter>,
}

/// On-disk shape of a module: walk parameters sit inline next to the
/// request lists. Kept separate so unknown keys are still rejected.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ModuleDef {
    #[serde(default)]
    walk: Vec<Oid>,
    #[serde(default)]
    get: Vec<Oid>,
    #[serde(default)]
    metrics: Vec<Metric>,
    #[serde(default)]
    filters: Vec<DynamicFilter>,
    #[serde(default = "default_max_repetitions")]
    max_repetitions: u32,
    #[serde(default = "default_retries")]
    retries: u32,
    #[serde(default = "default_timeout", with = "duration")]
    timeout: Duration,
    #[serde(default)]
    use_unconnected_udp_socket: bool,
    #[serde(default)]
    allow_nonincreasing_oids: bool,
}

fn default_max_repetitions() -> u32 {
    DEFAULT_MAX_REPETITIONS
}

fn default_retries() -> u32 {
    DEFAULT_RETRIES
}

fn default_timeout() -> Duration {
    DEFAULT_TIMEOUT
}

impl From<ModuleDef> for Module {
    fn from(def: ModuleDef) -> Self {
        Self {
            walk: def.walk,
            get: def.get,
            metrics: def.metrics,
            filters: def.filters,
            walk_params: WalkParams {
                max_repetitions: def.max_repetitions,
                retries: def.retries,
                timeout: def.timeout,
                use_unconnected_udp_socket: def.use_unconnected_udp_socket,
                allow_nonincreasing_oids: def.allow_nonincreasing_oids,
            },
        }
    }
}

impl Module {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn walk(mut self, oid: Oid) -> Self {
        self.walk.push(oid);
        self
    }

    pub fn get(mut self, oid: Oid) -> Self {
        self.get.push(oid);
        self
    }

    pub fn metric(mut self, metric: Metric) -> Self {
        self.metrics.push(metric);
        self
    }

    pub fn filter(mut self, filter: DynamicFilter) -> Self {
        self.filters.push(filter);
        self
    }
}

/// A module together with the name it is configured under.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedModule {
    pub name: String,
    pub module: Module,
}

impl NamedModule {
    pub fn new(name: impl Into<String>, module: Module) -> Self {
        Self {
            name: name.into(),
            module,
        }
    }
}
