//! Shared test infrastructure for snmp-exporter.
//!
//! Provides tracing setup and realistic IF-MIB fixtures served by the mock
//! scraper.

// Not every test file uses every helper.
#![allow(dead_code)]

pub mod fixtures;

pub use fixtures::{if_mib_agent, if_mib_module, system_module};

/// Install a test-friendly subscriber once. Honors `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
