//! In-process application stats.
//!
//! `appstats` accumulates three kinds of state from concurrently executing application code:
//! monotonic counters, overwrite-on-set string labels, and timing metrics backed by a
//! bounded-memory streaming histogram that answers quantile queries without ever retaining the
//! individual observations.  A [`Registry`] owns all three and renders a point-in-time
//! [`Snapshot`] for exposition; the `appstats-exporter-http` crate serves that snapshot as JSON
//! over HTTP.
//!
//! ```
//! use appstats::Registry;
//!
//! let registry = Registry::new();
//! registry.increment_counter("requests");
//! registry.set_label("version", "1.0.1");
//! let value = registry.time("lookup", || 2 + 2);
//! assert_eq!(value, 4);
//!
//! let snapshot = registry.snapshot();
//! assert_eq!(snapshot.counters["requests"], 1);
//! assert_eq!(snapshot.metrics["lookup"].count(), 1);
//! ```
#![deny(missing_docs)]

mod histogram;
pub use histogram::{HistogramError, NumericHistogram, DEFAULT_BIN_LIMIT};

mod metric;
pub use metric::{Metric, MetricSnapshot};

mod quantile;
pub use quantile::{parse_quantiles, Quantile, DEFAULT_QUANTILES};

mod registry;
pub use registry::{default_registry, Registry};

mod snapshot;
pub use snapshot::Snapshot;
