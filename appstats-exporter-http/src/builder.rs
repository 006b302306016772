use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use appstats::{Registry, DEFAULT_BIN_LIMIT, DEFAULT_QUANTILES};

use crate::common::BuildError;
use crate::http_listener::StatsServer;

/// Builder for creating a [`StatsServer`].
pub struct ServerBuilder {
    listen_address: SocketAddr,
    bin_limit: usize,
    quantiles: Vec<f64>,
}

impl ServerBuilder {
    /// Creates a new [`ServerBuilder`] with default settings.
    pub fn new() -> ServerBuilder {
        ServerBuilder {
            listen_address: SocketAddr::new(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)), 9000),
            bin_limit: DEFAULT_BIN_LIMIT,
            quantiles: DEFAULT_QUANTILES.to_vec(),
        }
    }

    /// Sets the listen address for the stats endpoint.
    ///
    /// Defaults to `0.0.0.0:9000`.
    pub fn listen_address(mut self, addr: impl Into<SocketAddr>) -> ServerBuilder {
        self.listen_address = addr.into();
        self
    }

    /// Sets the bin budget for every timing metric's streaming histogram.
    ///
    /// Larger budgets give finer quantile estimates at the cost of memory; validated when
    /// [`build`](Self::build) is called.
    pub fn histogram_bin_limit(mut self, bin_limit: usize) -> ServerBuilder {
        self.bin_limit = bin_limit;
        self
    }

    /// Sets the quantiles rendered for every timing metric.
    ///
    /// Quantiles are on a scale of 0 to 1, so 0.99 is the 99th percentile and 0.999 the 99.9th.
    pub fn set_quantiles(mut self, quantiles: &[f64]) -> ServerBuilder {
        self.quantiles = quantiles.to_vec();
        self
    }

    /// Builds the [`StatsServer`], creating its registry.
    ///
    /// The listen address is not bound until [`StatsServer::start`] is called.
    pub fn build(self) -> Result<StatsServer, BuildError> {
        let registry = Registry::with_settings(self.bin_limit, &self.quantiles)?;
        Ok(StatsServer::new(registry, self.listen_address))
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        ServerBuilder::new()
    }
}

#[cfg(test)]
mod tests {
    use appstats::HistogramError;

    use super::ServerBuilder;
    use crate::common::BuildError;

    #[test]
    fn default_settings_build() {
        assert!(ServerBuilder::new().build().is_ok());
    }

    #[test]
    fn zero_bin_limit_is_rejected_at_build() {
        let error = ServerBuilder::new().histogram_bin_limit(0).build().unwrap_err();
        assert!(matches!(error, BuildError::InvalidSettings(HistogramError::ZeroBinLimit)));
    }
}
