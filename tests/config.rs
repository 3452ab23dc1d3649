//! Configuration files driving a full scrape.
//!
//! Run with: `cargo test --test config`

mod common;

use common::if_mib_agent;
use snmp_exporter::{Collector, CollectorOptions, Config, Metrics, NamedModule, Sample};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

const IF_MIB: &str = r#"
auths:
  public_v2:
    community: public
    version: 2
modules:
  if_mib:
    walk:
      - 1.3.6.1.2.1.2.2.1.2
      - 1.3.6.1.2.1.2.2.1.4
      - 1.3.6.1.2.1.2.2.1.8
    metrics:
      - name: ifMtu
        oid: 1.3.6.1.2.1.2.2.1.4
        type: gauge
        help: The size of the largest packet which can be sent/received on the interface.
        indexes:
          - labelname: ifIndex
            type: gauge
        lookups:
          - labels: [ifIndex]
            labelname: ifDescr
            oid: 1.3.6.1.2.1.2.2.1.2
            type: DisplayString
      - name: ifOperStatus
        oid: 1.3.6.1.2.1.2.2.1.8
        type: EnumAsStateSet
        indexes:
          - labelname: ifIndex
            type: gauge
        enum_values:
          1: up
          2: down
"#;

const SYSTEM: &str = r#"
modules:
  system:
    get:
      - 1.3.6.1.2.1.1.5.0
    retries: 1
    timeout: 2s
    metrics:
      - name: sysName
        oid: 1.3.6.1.2.1.1.5
        type: DisplayString
        regex_extracts:
          _id:
            - regex: 'core-(\d+)'
"#;

fn scratch_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "snmp-exporter-it-{tag}-{}",
        std::process::id()
    ));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn load(tag: &str, files: &[(&str, &str)]) -> Config {
    let dir = scratch_dir(tag);
    for (name, body) in files {
        std::fs::write(dir.join(name), body).unwrap();
    }
    let pattern = dir.join("*.yml");
    Config::load_files([pattern.to_string_lossy()], false).unwrap()
}

async fn scrape(config: &Config, auth: &str, modules: &[&str]) -> Vec<Sample> {
    let modules = modules
        .iter()
        .map(|name| NamedModule::new(*name, config.modules[*name].clone()))
        .collect();
    Collector::new(
        "192.0.2.1:161",
        config.auths[auth].clone(),
        modules,
        Metrics::unregistered().unwrap(),
        if_mib_agent(),
        CollectorOptions::default(),
    )
    .collect_all(CancellationToken::new())
    .await
}

#[tokio::test]
async fn loaded_module_scrapes_table() {
    let config = load("table", &[("if_mib.yml", IF_MIB)]);
    let samples = scrape(&config, "public_v2", &["if_mib"]).await;
    assert!(samples.iter().all(Sample::is_valid));

    let mtu = samples
        .iter()
        .find(|s| s.name == "ifMtu" && s.label("ifIndex") == Some("3"))
        .unwrap();
    assert_eq!(mtu.value, 1500.0);
    assert_eq!(mtu.label("ifDescr"), Some("eth1"));

    let mut down: Vec<(&str, f64)> = samples
        .iter()
        .filter(|s| s.name == "ifOperStatus" && s.label("ifIndex") == Some("2"))
        .map(|s| (s.label("ifOperStatus").unwrap(), s.value))
        .collect();
    down.sort_by(|a, b| a.0.cmp(b.0));
    assert_eq!(down, [("down", 1.0), ("up", 0.0)]);
}

#[tokio::test]
async fn files_merge_into_one_config() {
    let config = load("merge", &[("if_mib.yml", IF_MIB), ("system.yml", SYSTEM)]);
    assert_eq!(config.modules.len(), 2);
    assert_eq!(config.modules["system"].walk_params.retries, 1);

    let samples = scrape(&config, "public_v2", &["system", "if_mib"]).await;
    let id = samples.iter().find(|s| s.name == "sysName_id").unwrap();
    assert_eq!(id.value, 1.0);
    assert!(samples.iter().any(|s| s.name == "ifMtu"));
}

#[test]
fn invalid_auth_is_rejected() {
    let err = Config::from_yaml_str("auths:\n  v3:\n    version: 3\n    username: u\n    security_level: authPriv\n")
        .unwrap_err();
    assert!(err.to_string().contains("auth \"v3\""), "{err}");
}

#[test]
fn unknown_metric_type_is_rejected() {
    let yaml = "modules:\n  m:\n    metrics:\n      - name: x\n        oid: 1.1\n        type: Widget\n";
    assert!(Config::from_yaml_str(yaml).is_err());
}
