//! Serves [`appstats`] registry snapshots as JSON over HTTP.
//!
//! The endpoint exposes a single route, `GET /stats`, returning the full registry state — every
//! counter, timing metric (with quantile estimates), and label — as one JSON document:
//!
//! ```json
//! { "counters": { "requests": 12 },
//!   "metrics":  { "lookup": { "count": 3, "sum": 10, "avg": 3,
//!                             "p25": 3, "p50": 3, "p75": 4, "p90": 4,
//!                             "p95": 4, "p99": 4, "p999": 4, "p9999": 4 } },
//!   "labels":   { "version": "1.0.1" } }
//! ```
//!
//! ```no_run
//! use appstats_exporter_http::ServerBuilder;
//!
//! let server = ServerBuilder::new()
//!     .listen_address(([127, 0, 0, 1], 9000))
//!     .build()
//!     .expect("failed to build stats server");
//! server.start().expect("failed to bind stats endpoint");
//!
//! let registry = server.registry();
//! registry.increment_counter("requests");
//! ```
#![deny(missing_docs)]

mod common;
pub use common::BuildError;

mod builder;
pub use builder::ServerBuilder;

mod http_listener;
pub use http_listener::StatsServer;
