//! Min-max scaling of sold quantities.

use serde::{Deserialize, Serialize};

/// Normalized value used for every quantity when the series is constant.
pub const DEGENERATE_LEVEL: f64 = 0.5;

/// Observed quantity range; used for both directions of the transform.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuantityScale {
    pub min: f64,
    pub max: f64,
}

impl QuantityScale {
    /// Compute the scale over all `values`. `None` if empty or non-finite.
    pub fn fit(values: &[f64]) -> Option<Self> {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for &v in values {
            min = min.min(v);
            max = max.max(v);
        }
        if !(min.is_finite() && max.is_finite()) {
            return None;
        }
        Some(Self { min, max })
    }

    pub fn range(&self) -> f64 {
        self.max - self.min
    }

    /// True when all observed quantities were identical.
    pub fn is_degenerate(&self) -> bool {
        self.range() == 0.0
    }

    /// `(q - min) / (max - min)`, or `DEGENERATE_LEVEL` for a constant series.
    pub fn normalize(&self, q: f64) -> f64 {
        if self.is_degenerate() {
            return DEGENERATE_LEVEL;
        }
        (q - self.min) / self.range()
    }

    pub fn normalize_all(&self, values: &[f64]) -> Vec<f64> {
        values.iter().map(|&q| self.normalize(q)).collect()
    }

    /// `round(value * (max - min) + min)`.
    ///
    /// For a constant series this is `round(min)` whatever `value` is.
    pub fn denormalize(&self, value: f64) -> i64 {
        (value * self.range() + self.min).round() as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_and_normalize() {
        let scale = QuantityScale::fit(&[10.0, 80.0, 45.0]).unwrap();
        assert_eq!(scale, QuantityScale { min: 10.0, max: 80.0 });
        assert_eq!(scale.normalize(10.0), 0.0);
        assert_eq!(scale.normalize(80.0), 1.0);
        assert!((scale.normalize(45.0) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn denormalize_midpoint() {
        let scale = QuantityScale { min: 10.0, max: 80.0 };
        assert_eq!(scale.denormalize(0.5), 45);
    }

    #[test]
    fn round_trip_recovers_rounded_quantity() {
        let values = [3.0, 17.4, 250.0, 99.2, 120.7, 0.0];
        let scale = QuantityScale::fit(&values).unwrap();
        for &q in &values {
            assert_eq!(scale.denormalize(scale.normalize(q)), q.round() as i64, "q={q}");
        }
    }

    #[test]
    fn constant_series_does_not_divide_by_zero() {
        let scale = QuantityScale::fit(&[7.0, 7.0, 7.0]).unwrap();
        assert!(scale.is_degenerate());
        let normalized = scale.normalize_all(&[7.0, 7.0]);
        assert_eq!(normalized, vec![DEGENERATE_LEVEL, DEGENERATE_LEVEL]);
        assert_eq!(scale.denormalize(0.9), 7);
    }

    #[test]
    fn empty_or_non_finite_has_no_scale() {
        assert!(QuantityScale::fit(&[]).is_none());
        assert!(QuantityScale::fit(&[1.0, f64::INFINITY]).is_none());
    }
}
