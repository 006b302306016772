/// Quantiles rendered for every timing metric unless overridden.
pub const DEFAULT_QUANTILES: &[f64] = &[0.25, 0.50, 0.75, 0.90, 0.95, 0.99, 0.999, 0.9999];

/// A quantile paired with the abbreviated percentile label it renders under.
///
/// Exposition formats show percentiles in the familiar short form: a quantile of 0.99 renders as
/// `p99`, and 0.999 as `p999`.  The label keeps the digits of the percentile with the trailing
/// zeros of any fractional part dropped, so 0.50 is `p50` and 0.9999 is `p9999`.  The endpoints
/// 0.0 and 1.0 render as `min` and `max`.
///
/// Field names in the serialized snapshot document are these labels verbatim, which makes them a
/// compatibility contract for downstream consumers; see [`DEFAULT_QUANTILES`] for the stock set.
#[derive(Debug, Clone, PartialEq)]
pub struct Quantile {
    value: f64,
    label: String,
}

impl Quantile {
    /// Creates a `Quantile`, clamping `value` into `0.0..=1.0`.
    pub fn new(value: f64) -> Quantile {
        let value = value.clamp(0.0, 1.0);
        let label = if value == 0.0 {
            "min".to_owned()
        } else if value == 1.0 {
            "max".to_owned()
        } else {
            // Shortest-round-trip formatting of the percentile already omits trailing fractional
            // zeros, so 25.0 prints "25" and 99.9 prints "99.9"; dropping the dot gives the label.
            format!("p{}", value * 100.0).replace('.', "")
        };

        Quantile { value, label }
    }

    /// Gets the display label, e.g. `p50`.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Gets the quantile value, e.g. `0.5`.
    pub fn value(&self) -> f64 {
        self.value
    }
}

/// Builds a [`Quantile`] for each value in `quantiles`, in order.
pub fn parse_quantiles(quantiles: &[f64]) -> Vec<Quantile> {
    quantiles.iter().copied().map(Quantile::new).collect()
}
