//! Prefix trie from OID arcs to metric definitions.
//!
//! Built once per scrape from a module's metrics. A returned PDU name is
//! matched by walking its arcs from the root; the first node that carries a
//! metric is the metric's base OID and the arcs after it are the index.
//!
//! ```
//! use snmp_exporter::config::{Metric, MetricType};
//! use snmp_exporter::oid;
//! use snmp_exporter::tree::MetricTree;
//!
//! let metrics = vec![Metric::new("ifInOctets", oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 10), MetricType::Counter)];
//! let tree = MetricTree::new(&metrics);
//!
//! let (metric, index) = tree.lookup(&[1, 3, 6, 1, 2, 1, 2, 2, 1, 10, 3]).unwrap();
//! assert_eq!(metric.name, "ifInOctets");
//! assert_eq!(index, &[3]);
//! assert!(tree.lookup(&[1, 3, 6, 1, 2, 1, 2, 2, 1, 11, 3]).is_none());
//! ```

use crate::config::Metric;
use std::collections::HashMap;

#[derive(Debug, Default)]
struct Node<'a> {
    metric: Option<&'a Metric>,
    children: HashMap<u32, Node<'a>>,
}

/// Metric definitions keyed by base OID.
#[derive(Debug, Default)]
pub struct MetricTree<'a> {
    root: Node<'a>,
}

impl<'a> MetricTree<'a> {
    /// Build the trie. A later metric with the same base OID replaces an earlier one.
    pub fn new(metrics: &'a [Metric]) -> Self {
        let mut root = Node::default();
        for metric in metrics {
            let mut head = &mut root;
            for arc in metric.oid.arcs() {
                head = head.children.entry(*arc).or_default();
            }
            head.metric = Some(metric);
        }
        Self { root }
    }

    /// Find the metric for `oid` and the index arcs that follow its base.
    ///
    /// The shortest metric-bearing prefix wins.
    pub fn lookup<'o>(&self, oid: &'o [u32]) -> Option<(&'a Metric, &'o [u32])> {
        let mut head = &self.root;
        for (i, arc) in oid.iter().enumerate() {
            head = head.children.get(arc)?;
            if let Some(metric) = head.metric {
                return Some((metric, &oid[i + 1..]));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MetricType;
    use crate::oid;

    fn metric(name: &str, oid: crate::Oid) -> Metric {
        Metric::new(name, oid, MetricType::Gauge)
    }

    #[test]
    fn scalar_and_column() {
        let metrics = vec![
            metric("sysUpTime", oid!(1, 3, 6, 1, 2, 1, 1, 3)),
            metric("ifMtu", oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 4)),
        ];
        let tree = MetricTree::new(&metrics);

        let (m, index) = tree.lookup(&[1, 3, 6, 1, 2, 1, 1, 3, 0]).unwrap();
        assert_eq!(m.name, "sysUpTime");
        assert_eq!(index, &[0]);

        let (m, index) = tree.lookup(&[1, 3, 6, 1, 2, 1, 2, 2, 1, 4, 10, 2]).unwrap();
        assert_eq!(m.name, "ifMtu");
        assert_eq!(index, &[10, 2]);
    }

    #[test]
    fn shortest_prefix_wins() {
        let metrics = vec![
            metric("deep", oid!(1, 2, 3, 4)),
            metric("shallow", oid!(1, 2)),
        ];
        let tree = MetricTree::new(&metrics);
        let (m, index) = tree.lookup(&[1, 2, 3, 4, 5]).unwrap();
        assert_eq!(m.name, "shallow");
        assert_eq!(index, &[3, 4, 5]);
    }

    #[test]
    fn base_oid_has_empty_index() {
        let metrics = vec![metric("a", oid!(1, 2))];
        let tree = MetricTree::new(&metrics);
        let (_, index) = tree.lookup(&[1, 2]).unwrap();
        assert!(index.is_empty());
    }

    #[test]
    fn misses() {
        let metrics = vec![metric("a", oid!(1, 2, 3))];
        let tree = MetricTree::new(&metrics);
        assert!(tree.lookup(&[1, 2]).is_none());
        assert!(tree.lookup(&[1, 2, 4, 1]).is_none());
        assert!(tree.lookup(&[]).is_none());
        assert!(MetricTree::new(&[]).lookup(&[1]).is_none());
    }

    #[test]
    fn duplicate_oid_last_wins() {
        let metrics = vec![metric("first", oid!(1, 2)), metric("second", oid!(1, 2))];
        let tree = MetricTree::new(&metrics);
        assert_eq!(tree.lookup(&[1, 2, 0]).unwrap().0.name, "second");
    }
}
