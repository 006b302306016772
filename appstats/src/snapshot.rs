use std::collections::BTreeMap;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::metric::MetricSnapshot;

/// A point-in-time rendering of a [`Registry`](crate::Registry): every counter, timing metric,
/// and label at the moment the snapshot was taken.
///
/// The maps are ordered, so serializing the same state twice yields byte-identical documents.
/// Serialization of a well-formed snapshot always succeeds; a failure here means an internal
/// invariant was broken, not a runtime condition worth handling.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    /// Monotonic counters by name.
    pub counters: BTreeMap<String, u64>,
    /// Timing metrics by name.  Metrics that have not recorded an observation are omitted.
    pub metrics: BTreeMap<String, MetricSnapshot>,
    /// Last-written labels by name.
    pub labels: BTreeMap<String, String>,
}

impl Serialize for MetricSnapshot {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(3 + self.quantiles().len()))?;
        map.serialize_entry("count", &self.count())?;
        map.serialize_entry("sum", &self.sum())?;
        map.serialize_entry("avg", &self.avg())?;
        for (quantile, estimate) in self.quantiles() {
            map.serialize_entry(quantile.label(), estimate)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use crate::metric::Metric;
    use crate::quantile::{parse_quantiles, DEFAULT_QUANTILES};

    use super::Snapshot;

    fn sample_snapshot() -> Snapshot {
        let metric = Metric::new(16).expect("nonzero bin limit");
        metric.add(3);
        metric.add(3);
        metric.add(4);

        let mut counters = BTreeMap::new();
        counters.insert("requests".to_owned(), 12u64);
        counters.insert("errors".to_owned(), 1u64);

        let mut metrics = BTreeMap::new();
        metrics.insert(
            "db_query".to_owned(),
            metric.snapshot(&parse_quantiles(DEFAULT_QUANTILES)).expect("metric has observations"),
        );

        let mut labels = BTreeMap::new();
        labels.insert("version".to_owned(), "1.0.1".to_owned());

        Snapshot { counters, metrics, labels }
    }

    #[test]
    fn document_has_the_three_sections() {
        let value = serde_json::to_value(sample_snapshot()).expect("serialization succeeds");

        assert_eq!(value.as_object().expect("top level is an object").len(), 3);
        assert_eq!(value["counters"]["requests"], 12);
        assert_eq!(value["labels"]["version"], "1.0.1");

        // The wire document leads with counters, then metrics, then labels.
        let rendered = serde_json::to_string(&sample_snapshot()).expect("serialization succeeds");
        let position = |needle: &str| rendered.find(needle).expect("section rendered");
        assert!(position("\"counters\"") < position("\"metrics\""));
        assert!(position("\"metrics\"") < position("\"labels\""));
        assert!(position("\"count\":") < position("\"sum\":"));
        assert!(position("\"sum\":") < position("\"avg\":"));
        assert!(position("\"avg\":") < position("\"p25\":"));
    }

    #[test]
    fn metric_fields_follow_the_naming_contract() {
        let value = serde_json::to_value(sample_snapshot()).expect("serialization succeeds");

        let metric = value["metrics"]["db_query"].as_object().expect("metric is an object");
        let fields: Vec<_> = metric.keys().cloned().collect();
        assert_eq!(
            fields,
            ["avg", "count", "p25", "p50", "p75", "p90", "p95", "p99", "p999", "p9999", "sum"]
        );

        assert_eq!(metric["count"], 3);
        assert_eq!(metric["sum"], 10);
        // 10 / 3 truncates.
        assert_eq!(metric["avg"], 3);
    }

    #[test]
    fn rendering_is_stable() {
        let first = serde_json::to_string(&sample_snapshot()).expect("serialization succeeds");
        let second = serde_json::to_string(&sample_snapshot()).expect("serialization succeeds");
        assert_eq!(first, second);

        // BTreeMap ordering puts "errors" ahead of "requests" regardless of insertion order.
        let errors = first.find("errors").expect("counter rendered");
        let requests = first.find("requests").expect("counter rendered");
        assert!(errors < requests);
    }
}
