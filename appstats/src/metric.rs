use parking_lot::Mutex;

use crate::histogram::{HistogramError, NumericHistogram};
use crate::quantile::Quantile;

/// A single named timing metric: observation count, running sum, and a streaming histogram.
///
/// All three pieces are updated together under one mutex, so a concurrent reader never sees a
/// count that disagrees with the histogram's total weight.  The histogram itself is only
/// allocated once the first observation arrives, keeping metrics that are registered but never
/// hit effectively free.
#[derive(Debug)]
pub struct Metric {
    bin_limit: usize,
    inner: Mutex<Inner>,
}

#[derive(Debug)]
struct Inner {
    count: u64,
    sum: i64,
    histogram: Option<NumericHistogram>,
}

impl Metric {
    /// Creates an empty `Metric` whose histogram will hold at most `bin_limit` bins.
    ///
    /// Returns an error if `bin_limit` is zero.
    pub fn new(bin_limit: usize) -> Result<Metric, HistogramError> {
        if bin_limit == 0 {
            return Err(HistogramError::ZeroBinLimit);
        }

        Ok(Metric { bin_limit, inner: Mutex::new(Inner { count: 0, sum: 0, histogram: None }) })
    }

    /// Records a single observation.
    pub fn add(&self, value: i64) {
        let mut inner = self.inner.lock();
        inner.count += 1;
        inner.sum += value;
        inner
            .histogram
            .get_or_insert_with(|| {
                NumericHistogram::new(self.bin_limit).expect("bin limit validated in new")
            })
            .insert(value as f64);
    }

    /// Takes a point-in-time view of this metric, with an estimate for each of `quantiles`.
    ///
    /// Returns `None` if no observations have been recorded yet.
    pub fn snapshot(&self, quantiles: &[Quantile]) -> Option<MetricSnapshot> {
        let inner = self.inner.lock();
        if inner.count == 0 {
            return None;
        }

        let histogram = inner.histogram.as_ref().expect("histogram exists once count is nonzero");
        let quantiles = quantiles
            .iter()
            .map(|q| (q.clone(), histogram.quantile(q.value()).unwrap_or(0.0) as i64))
            .collect();

        Some(MetricSnapshot { count: inner.count, sum: inner.sum, quantiles })
    }
}

/// A read-only view of one [`Metric`] at a single instant.
///
/// Only produced by [`Metric::snapshot`], which guarantees a nonzero count.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSnapshot {
    count: u64,
    sum: i64,
    quantiles: Vec<(Quantile, i64)>,
}

impl MetricSnapshot {
    /// Gets the number of observations recorded.
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Gets the running sum of all observed values.
    pub fn sum(&self) -> i64 {
        self.sum
    }

    /// Gets the mean observed value, truncated toward zero.
    pub fn avg(&self) -> i64 {
        self.sum / self.count as i64
    }

    /// Gets the quantile estimates, in the order they were requested.
    pub fn quantiles(&self) -> &[(Quantile, i64)] {
        &self.quantiles
    }
}
