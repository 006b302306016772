use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use hashbrown::HashMap;
use once_cell::sync::Lazy;
use parking_lot::{Mutex, RwLock};
use tracing::debug;

use crate::histogram::{HistogramError, DEFAULT_BIN_LIMIT};
use crate::metric::Metric;
use crate::quantile::{parse_quantiles, Quantile, DEFAULT_QUANTILES};
use crate::snapshot::Snapshot;

static DEFAULT_REGISTRY: Lazy<Registry> = Lazy::new(Registry::new);

/// Gets the process-wide default registry.
///
/// Convenient for applications that want a single implicit sink.  Anything that needs isolation,
/// tests in particular, should construct its own [`Registry`] instead.
pub fn default_registry() -> &'static Registry {
    &DEFAULT_REGISTRY
}

/// A process-wide collection of named counters, labels, and timing metrics.
///
/// Counters, labels, and metrics each live behind their own lock, so traffic against one kind
/// never serializes behind the others.  Metrics additionally take only a brief map-level lock to
/// find their entry; the actual observation is recorded under that metric's own mutex, keeping
/// unrelated metrics from contending with each other.  Entries are created on first use and never
/// removed.
///
/// All operations take `&self` and the registry is `Sync`, so a single instance can be shared
/// freely across threads.
#[derive(Debug)]
pub struct Registry {
    counters: Mutex<HashMap<String, u64>>,
    labels: Mutex<HashMap<String, String>>,
    metrics: RwLock<HashMap<String, Arc<Metric>>>,
    bin_limit: usize,
    quantiles: Vec<Quantile>,
}

impl Registry {
    /// Creates an empty `Registry` with the default histogram bin budget and quantile set.
    pub fn new() -> Registry {
        Registry {
            counters: Mutex::new(HashMap::new()),
            labels: Mutex::new(HashMap::new()),
            metrics: RwLock::new(HashMap::new()),
            bin_limit: DEFAULT_BIN_LIMIT,
            quantiles: parse_quantiles(DEFAULT_QUANTILES),
        }
    }

    /// Creates an empty `Registry` with a custom histogram bin budget and quantile set.
    ///
    /// Returns an error if `bin_limit` is zero.
    pub fn with_settings(bin_limit: usize, quantiles: &[f64]) -> Result<Registry, HistogramError> {
        if bin_limit == 0 {
            return Err(HistogramError::ZeroBinLimit);
        }

        Ok(Registry { bin_limit, quantiles: parse_quantiles(quantiles), ..Registry::new() })
    }

    /// Increments the named counter by 1, creating it at zero first if absent.
    pub fn increment_counter(&self, name: &str) {
        let mut counters = self.counters.lock();
        *counters.entry_ref(name).or_insert(0) += 1;
    }

    /// Sets the named label, overwriting any previous value.
    pub fn set_label(&self, name: impl Into<String>, value: impl Into<String>) {
        self.labels.lock().insert(name.into(), value.into());
    }

    /// Runs `f` and records its wall-clock elapsed time, in nanoseconds, against the named
    /// metric.  Returns whatever `f` returned.
    ///
    /// The measured interval covers exactly the closure call; registry bookkeeping happens
    /// outside it.  If `f` panics, nothing is recorded and the panic propagates — callers that
    /// want failure-path timing should catch the failure inside the closure.
    pub fn time<F, R>(&self, name: &str, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let start = Instant::now();
        let result = f();
        let elapsed = start.elapsed();

        self.metric(name).add(elapsed.as_nanos() as i64);
        result
    }

    /// Takes a point-in-time snapshot of every counter, label, and metric.
    ///
    /// Each individual entry is internally consistent, but entries are read one at a time;
    /// concurrent writers may leave two entries in the same snapshot reflecting slightly
    /// different instants.  No registry-wide lock is held while per-metric state is read.
    pub fn snapshot(&self) -> Snapshot {
        let counters: BTreeMap<_, _> =
            self.counters.lock().iter().map(|(name, value)| (name.clone(), *value)).collect();
        let labels: BTreeMap<_, _> =
            self.labels.lock().iter().map(|(name, value)| (name.clone(), value.clone())).collect();

        let handles: Vec<_> = self
            .metrics
            .read()
            .iter()
            .map(|(name, metric)| (name.clone(), Arc::clone(metric)))
            .collect();

        let mut metrics = BTreeMap::new();
        for (name, metric) in handles {
            // A metric whose first observation is still in flight has nothing to report yet.
            if let Some(snapshot) = metric.snapshot(&self.quantiles) {
                metrics.insert(name, snapshot);
            }
        }

        Snapshot { counters, metrics, labels }
    }

    fn metric(&self, name: &str) -> Arc<Metric> {
        {
            let metrics = self.metrics.read();
            if let Some(metric) = metrics.get(name) {
                return Arc::clone(metric);
            }
        }

        // Upgrade to the write lock; another writer may have created the entry in between.
        let mut metrics = self.metrics.write();
        Arc::clone(metrics.entry_ref(name).or_insert_with(|| {
            debug!(metric = name, "creating timing metric on first use");
            Arc::new(Metric::new(self.bin_limit).expect("bin limit validated at construction"))
        }))
    }
}

impl Default for Registry {
    fn default() -> Self {
        Registry::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    use crate::histogram::HistogramError;

    use super::{default_registry, Registry};

    #[test]
    fn counters_create_on_first_increment() {
        let registry = Registry::new();
        registry.increment_counter("requests");
        registry.increment_counter("requests");

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.counters.get("requests"), Some(&2));
    }

    #[test]
    fn labels_overwrite() {
        let registry = Registry::new();
        registry.set_label("version", "1.0.0");
        registry.set_label("version", "1.0.1");

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.labels.get("version").map(String::as_str), Some("1.0.1"));
    }

    #[test]
    fn rejects_zero_bin_limit() {
        assert_eq!(Registry::with_settings(0, &[0.5]).unwrap_err(), HistogramError::ZeroBinLimit);
    }

    #[test]
    fn empty_registry_snapshots_empty() {
        let snapshot = Registry::new().snapshot();
        assert!(snapshot.counters.is_empty());
        assert!(snapshot.metrics.is_empty());
        assert!(snapshot.labels.is_empty());
    }

    #[test]
    fn registries_are_isolated() {
        let a = Registry::new();
        let b = Registry::new();
        a.increment_counter("only_in_a");

        assert!(b.snapshot().counters.is_empty());
    }

    #[test]
    fn default_registry_is_a_singleton() {
        assert!(std::ptr::eq(default_registry(), default_registry()));
    }

    #[test]
    fn time_returns_the_closure_value() {
        let registry = Registry::new();
        let value = registry.time("op", || 7);
        assert_eq!(value, 7);
    }

    #[test]
    fn time_records_elapsed_nanoseconds() {
        let registry = Registry::new();
        registry.time("op", || thread::sleep(Duration::from_millis(10)));

        let snapshot = registry.snapshot();
        let metric = snapshot.metrics.get("op").expect("metric recorded");
        assert_eq!(metric.count(), 1);

        // Sleep may overshoot, but never undershoots and should stay well under half a second.
        let (_, p50) = metric
            .quantiles()
            .iter()
            .find(|(q, _)| q.label() == "p50")
            .expect("p50 is in the default set");
        assert!(*p50 >= 10_000_000, "p50 below the slept duration: {}", p50);
        assert!(*p50 < 500_000_000, "p50 implausibly large: {}", p50);
    }

    #[test]
    fn concurrent_increments_are_not_lost() {
        let registry = Arc::new(Registry::new());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || {
                    for _ in 0..1000 {
                        registry.increment_counter("shared");
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().expect("writer thread panicked");
        }

        assert_eq!(registry.snapshot().counters.get("shared"), Some(&8000));
    }

    #[test]
    fn snapshots_stay_consistent_under_concurrent_writes() {
        let registry = Arc::new(Registry::new());
        let stop = Arc::new(AtomicBool::new(false));

        let writers: Vec<_> = (0..4)
            .map(|i| {
                let registry = Arc::clone(&registry);
                let stop = Arc::clone(&stop);
                thread::spawn(move || {
                    let value = if i % 2 == 0 { "aaaaaaaaaaaaaaaa" } else { "bbbbbbbbbbbbbbbb" };
                    while !stop.load(Ordering::Relaxed) {
                        registry.increment_counter("writes");
                        registry.time("work", || {});
                        registry.set_label("state", value);
                    }
                })
            })
            .collect();

        let mut last_count = 0;
        for _ in 0..50 {
            let snapshot = registry.snapshot();
            if let Some(count) = snapshot.counters.get("writes") {
                assert!(*count >= last_count, "counter went backwards");
                last_count = *count;
            }
            if let Some(metric) = snapshot.metrics.get("work") {
                assert!(metric.count() > 0);
                assert!(metric.sum() >= 0, "count/sum mismatch: negative elapsed total");
            }
            if let Some(label) = snapshot.labels.get("state") {
                assert!(
                    label == "aaaaaaaaaaaaaaaa" || label == "bbbbbbbbbbbbbbbb",
                    "torn label value: {:?}",
                    label
                );
            }
        }

        stop.store(true, Ordering::Relaxed);
        for writer in writers {
            writer.join().expect("writer thread panicked");
        }
    }
}
