//! # snmp-exporter
//!
//! SNMP-to-metrics translation engine.
//!
//! Given a module configuration (which OIDs to fetch and how to interpret
//! them) and a [`Scraper`](scraper::Scraper) that talks to one agent, the
//! crate plans the requests, runs them, decodes table indexes, applies
//! lookups and value transforms, and produces Prometheus [`Sample`]s.
//!
//! ## Pipeline
//!
//! - [`planner`] evaluates dynamic filters and rewrites walks into gets
//! - [`executor`] runs the plan through the scraper
//! - [`samples`] matches PDUs to metric definitions and builds samples
//! - [`collector`] drives all of the above for a list of modules with a
//!   worker pool, and adds per-module timing samples
//! - [`exposition`] turns samples into Prometheus metric families
//!
//! ## Quick Start
//!
//! ```rust
//! use snmp_exporter::config::{Auth, Index, IndexType, Metric, MetricType, Module, NamedModule};
//! use snmp_exporter::scraper::MockScraper;
//! use snmp_exporter::{Collector, CollectorOptions, Metrics, Pdu, oid};
//! use tokio_util::sync::CancellationToken;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let agent = MockScraper::new();
//! agent.add_pdu(Pdu::new(oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 4, 1), 1500));
//!
//! let module = Module::new().walk(oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 4)).metric(
//!     Metric::new("ifMtu", oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 4), MetricType::Gauge)
//!         .index(Index::new("ifIndex", IndexType::Gauge)),
//! );
//!
//! let collector = Collector::new(
//!     "192.0.2.1",
//!     Auth::default(),
//!     vec![NamedModule::new("if_mib", module)],
//!     Metrics::unregistered().unwrap(),
//!     agent,
//!     CollectorOptions::default(),
//! );
//! let samples = collector.collect_all(CancellationToken::new()).await;
//! assert!(samples.iter().any(|s| s.to_string() == r#"ifMtu{ifIndex="1"} 1500"#));
//! # }
//! ```

pub mod collector;
pub mod config;
pub mod error;
pub mod executor;
pub mod exposition;
pub mod format;
pub mod index;
pub mod metrics;
pub mod oid;
pub mod pdu;
pub mod planner;
pub mod sample;
pub mod samples;
pub mod scraper;
pub mod tree;
pub mod value;

// Re-exports for convenience
pub use collector::{Collector, CollectorOptions};
pub use config::{Config, Module, NamedModule};
pub use error::{Error, ErrorStatus, Result};
pub use metrics::Metrics;
pub use oid::Oid;
pub use pdu::{Packet, Pdu};
pub use sample::{Sample, ValueType};
pub use samples::{SampleBuilder, build_samples};
pub use scraper::{Scraper, ScraperFactory, ScraperOptions, Version};
pub use value::Value;
