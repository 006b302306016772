use thiserror::Error;

/// Default bin budget for streaming histograms.
pub const DEFAULT_BIN_LIMIT: usize = 200;

/// Errors from constructing or querying a [`NumericHistogram`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HistogramError {
    /// The bin budget must allow at least one bin.
    #[error("bin limit must be nonzero")]
    ZeroBinLimit,

    /// Quantile queries are only defined over `0.0..=1.0`.
    #[error("quantile {0} is outside the range 0.0 to 1.0")]
    InvalidQuantile(f64),

    /// The histogram has no samples to estimate from.
    #[error("histogram is empty")]
    Empty,
}

#[derive(Debug, Clone, Copy)]
struct Bin {
    center: f64,
    weight: u64,
}

/// A bounded-memory approximation of a streaming numeric distribution.
///
/// `NumericHistogram` ingests an unbounded stream of observations while holding at most a fixed
/// number of (center, weight) bins, kept sorted by center.  An observation matching an existing
/// center simply bumps that bin's weight; any other observation becomes a new unit-weight bin.
/// When an insertion pushes the histogram past its bin budget, the two adjacent bins with the
/// closest centers are folded into a single bin at their weighted mean, trading exactness for
/// O(1) space over the life of the stream.
///
/// Quantile estimates walk the cumulative weight across the sorted bins and interpolate linearly
/// between the two bin centers straddling the requested rank, so they degrade gracefully as bins
/// are merged rather than snapping to bucket boundaries.
#[derive(Debug, Clone)]
pub struct NumericHistogram {
    bins: Vec<Bin>,
    bin_limit: usize,
    total: u64,
}

impl NumericHistogram {
    /// Creates an empty `NumericHistogram` holding at most `bin_limit` bins.
    ///
    /// Returns an error if `bin_limit` is zero.
    pub fn new(bin_limit: usize) -> Result<NumericHistogram, HistogramError> {
        if bin_limit == 0 {
            return Err(HistogramError::ZeroBinLimit);
        }

        Ok(NumericHistogram { bins: Vec::new(), bin_limit, total: 0 })
    }

    /// Adds a single observation of weight 1.
    pub fn insert(&mut self, value: f64) {
        self.total += 1;

        match self.bins.binary_search_by(|bin| bin.center.total_cmp(&value)) {
            Ok(idx) => self.bins[idx].weight += 1,
            Err(idx) => {
                self.bins.insert(idx, Bin { center: value, weight: 1 });
                while self.bins.len() > self.bin_limit {
                    self.merge_closest_pair();
                }
            }
        }
    }

    /// Gets the estimated value at the given quantile.
    ///
    /// Returns an error if the histogram is empty or if `q` is outside `0.0..=1.0`.  For `q` at or
    /// below the midpoint rank of the first bin the first bin's center is returned as-is, and
    /// likewise for the last bin at the top end.
    pub fn quantile(&self, q: f64) -> Result<f64, HistogramError> {
        if !(0.0..=1.0).contains(&q) {
            return Err(HistogramError::InvalidQuantile(q));
        }
        if self.total == 0 {
            return Err(HistogramError::Empty);
        }

        let target = q * self.total as f64;

        // The midpoint rank of a bin is the weight of everything left of it plus half its own
        // weight; each bin's center is taken to sit at that rank.
        let mut cumulative = 0.0;
        let mut prev: Option<(f64, f64)> = None;
        for bin in &self.bins {
            let midpoint = cumulative + bin.weight as f64 / 2.0;
            if target <= midpoint {
                return Ok(match prev {
                    None => bin.center,
                    Some((prev_midpoint, prev_center)) => {
                        let fraction = (target - prev_midpoint) / (midpoint - prev_midpoint);
                        prev_center + (bin.center - prev_center) * fraction
                    }
                });
            }

            cumulative += bin.weight as f64;
            prev = Some((midpoint, bin.center));
        }

        Ok(self.bins[self.bins.len() - 1].center)
    }

    /// Gets the number of bins currently held.
    pub fn bin_count(&self) -> usize {
        self.bins.len()
    }

    /// Gets the maximum number of bins this histogram will hold.
    pub fn bin_limit(&self) -> usize {
        self.bin_limit
    }

    /// Gets the total weight across all bins, equal to the number of observations inserted.
    pub fn total_weight(&self) -> u64 {
        self.total
    }

    fn merge_closest_pair(&mut self) {
        let mut idx = 0;
        let mut gap = f64::INFINITY;
        for i in 0..self.bins.len() - 1 {
            // Strictly-less keeps the earliest pair on equal gaps.
            let d = self.bins[i + 1].center - self.bins[i].center;
            if d < gap {
                gap = d;
                idx = i;
            }
        }

        let right = self.bins.remove(idx + 1);
        let left = &mut self.bins[idx];
        let weight = left.weight + right.weight;

        // Incremental form of the weighted mean: the intermediate term stays on the order of the
        // centers themselves, where `(c1*w1 + c2*w2) / (w1+w2)` can lose precision once the
        // products get large.
        left.center += (right.center - left.center) * (right.weight as f64 / weight as f64);
        left.weight = weight;
    }
}
