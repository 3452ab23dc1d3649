//! Standard test fixtures with realistic MIB data.

use snmp_exporter::config::{
    DynamicFilter, Index, IndexType, Lookup, Metric, MetricType, Module,
};
use snmp_exporter::scraper::MockScraper;
use snmp_exporter::{Pdu, Value, oid};

/// ifTable column `col` (1.3.6.1.2.1.2.2.1.col).
pub fn if_column(col: u32) -> snmp_exporter::Oid {
    oid!(1, 3, 6, 1, 2, 1, 2, 2, 1).child(col)
}

/// Mock agent with the system group and a three-interface ifTable.
///
/// Interfaces 1 and 3 are up, interface 2 is down.
pub fn if_mib_agent() -> MockScraper {
    let mock = MockScraper::new();
    mock.add_pdus([
        Pdu::new(oid!(1, 3, 6, 1, 2, 1, 1, 3, 0), Value::TimeTicks(123456)),
        Pdu::new(oid!(1, 3, 6, 1, 2, 1, 1, 5, 0), Value::from(b"core-1".to_vec())),
    ]);
    let names: [&[u8]; 3] = [b"lo", b"eth0", b"eth1"];
    for (i, name) in names.iter().enumerate() {
        let index = i as u32 + 1;
        mock.add_pdus([
            Pdu::new(if_column(2).child(index), Value::from(name.to_vec())),
            Pdu::new(if_column(4).child(index), Value::Integer(1500)),
            Pdu::new(if_column(8).child(index), Value::Integer(if index == 2 { 2 } else { 1 })),
            Pdu::new(if_column(10).child(index), Value::Counter32(1000 * index)),
        ]);
    }
    mock
}

/// sysUpTime and sysName by point query.
pub fn system_module() -> Module {
    Module::new()
        .get(oid!(1, 3, 6, 1, 2, 1, 1, 3, 0))
        .get(oid!(1, 3, 6, 1, 2, 1, 1, 5, 0))
        .metric(
            Metric::new("sysUpTime", oid!(1, 3, 6, 1, 2, 1, 1, 3), MetricType::Gauge)
                .help("The time since the network management portion of the system was last re-initialized."),
        )
        .metric(
            Metric::new("sysName", oid!(1, 3, 6, 1, 2, 1, 1, 5), MetricType::DisplayString)
                .help("An administratively-assigned name for this managed node."),
        )
}

fn if_metric(name: &str, col: u32, metric_type: MetricType) -> Metric {
    Metric::new(name, if_column(col), metric_type)
        .help(format!("{name} from the ifTable."))
        .index(Index::new("ifIndex", IndexType::Gauge))
        .lookup(Lookup::new(["ifIndex"], "ifDescr", if_column(2)).with_type(IndexType::DisplayString))
}

/// ifTable walk with ifDescr lookups. With `only_up`, counters are
/// fetched only for interfaces whose ifOperStatus is up.
pub fn if_mib_module(only_up: bool) -> Module {
    let mut module = Module::new()
        .walk(if_column(2))
        .walk(if_column(4))
        .walk(if_column(8))
        .walk(if_column(10))
        .metric(if_metric("ifMtu", 4, MetricType::Gauge))
        .metric(
            if_metric("ifOperStatus", 8, MetricType::Gauge).enum_values([(1, "up"), (2, "down")]),
        )
        .metric(if_metric("ifInOctets", 10, MetricType::Counter));
    if only_up {
        module = module.filter(DynamicFilter {
            oid: if_column(8),
            targets: vec![if_column(10)],
            values: vec!["^1$".into()],
        });
    }
    module
}
