use std::io;

use thiserror::Error;

/// Errors from building or starting the stats endpoint.
#[derive(Debug, Error)]
pub enum BuildError {
    /// Binding/listening on the configured address did not succeed.
    ///
    /// This is fatal: the endpoint never retries the bind internally.
    #[error("failed to bind to listen address: {0}")]
    FailedToBindListener(String),

    /// The registry settings were rejected.
    #[error("invalid registry settings: {0}")]
    InvalidSettings(#[from] appstats::HistogramError),

    /// Creating the serving runtime or thread did not succeed.
    #[error("failed to spawn exporter runtime: {0}")]
    Io(#[from] io::Error),
}
