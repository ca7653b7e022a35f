//! Parametric (variance-covariance) Value at Risk and Conditional VaR on a
//! single return series.

use crate::error::{AnalyzeError, Result};
use serde::{Deserialize, Serialize};
use statrs::distribution::{Continuous, ContinuousCDF, Normal};
use statrs::statistics::Statistics;

pub const DEFAULT_CONFIDENCE_LEVEL: f64 = 0.95;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskMetrics {
    /// Return threshold not expected to be undercut at `confidence_level`.
    pub var: f64,
    /// Expected return given the VaR threshold is breached.
    pub cvar: f64,
    pub mean_return: f64,
    pub volatility: f64,
    pub confidence_level: f64,
}

impl RiskMetrics {
    pub fn zero(confidence_level: f64) -> Self {
        Self {
            var: 0.0,
            cvar: 0.0,
            mean_return: 0.0,
            volatility: 0.0,
            confidence_level,
        }
    }
}

/// Computes mean, population volatility, VaR and CVaR of `returns` under a
/// normal assumption. NaN entries are ignored; an empty series gives zeros.
pub fn risk_metrics(returns: &[f64], confidence_level: f64) -> Result<RiskMetrics> {
    if !(confidence_level > 0.0 && confidence_level < 1.0) {
        return Err(AnalyzeError::InvalidArgument(format!(
            "confidence level must be between 0 and 1 (got {confidence_level})"
        )));
    }

    let returns: Vec<f64> = returns.iter().copied().filter(|r| !r.is_nan()).collect();
    if returns.is_empty() {
        return Ok(RiskMetrics::zero(confidence_level));
    }

    let mean = returns.as_slice().mean();
    let volatility = returns.as_slice().population_std_dev();

    let alpha = 1.0 - confidence_level;
    let normal = Normal::new(0.0, 1.0).map_err(|e| anyhow::anyhow!("standard normal: {e}"))?;
    let z = normal.inverse_cdf(alpha);

    Ok(RiskMetrics {
        var: mean + z * volatility,
        cvar: mean - volatility * (normal.pdf(z) / alpha),
        mean_return: mean,
        volatility,
        confidence_level,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn empty_series_is_all_zero() {
        let m = risk_metrics(&[], DEFAULT_CONFIDENCE_LEVEL).unwrap();
        assert_eq!(m, RiskMetrics::zero(0.95));
    }

    #[test]
    fn all_nan_series_is_all_zero() {
        let m = risk_metrics(&[f64::NAN, f64::NAN], 0.99).unwrap();
        assert_eq!(m, RiskMetrics::zero(0.99));
    }

    #[test]
    fn uses_population_standard_deviation() {
        // mean 0.0, population variance 0.0004
        let m = risk_metrics(&[0.02, -0.02, 0.02, -0.02], 0.95).unwrap();
        assert_relative_eq!(m.mean_return, 0.0, epsilon = 1e-15);
        assert_relative_eq!(m.volatility, 0.02, epsilon = 1e-12);
    }

    #[test]
    fn matches_closed_form_at_95() {
        let returns = [0.01, -0.02, 0.015, 0.003, -0.007, 0.012, -0.011];
        let m = risk_metrics(&returns, 0.95).unwrap();

        let n = returns.len() as f64;
        let mean = returns.iter().sum::<f64>() / n;
        let vol = (returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n).sqrt();
        let z = -1.644_853_626_951_472_2;
        let pdf_z = 0.103_135_277_678_383_67;

        assert_relative_eq!(m.mean_return, mean, epsilon = 1e-12);
        assert_relative_eq!(m.volatility, vol, epsilon = 1e-12);
        assert_relative_eq!(m.var, mean + z * vol, epsilon = 1e-8);
        assert_relative_eq!(m.cvar, mean - vol * pdf_z / 0.05, epsilon = 1e-8);
        assert!(m.cvar < m.var);
        assert!(m.var < m.mean_return);
    }

    #[test]
    fn ignores_nan_entries() {
        let clean = risk_metrics(&[0.01, -0.01, 0.02], 0.9).unwrap();
        let noisy = risk_metrics(&[0.01, f64::NAN, -0.01, 0.02], 0.9).unwrap();
        assert_eq!(clean, noisy);
    }

    #[test]
    fn rejects_out_of_range_confidence() {
        for c in [0.0, 1.0, -0.5, 1.5, f64::NAN] {
            assert!(matches!(
                risk_metrics(&[0.01], c),
                Err(AnalyzeError::InvalidArgument(_))
            ));
        }
    }

    #[test]
    fn constant_returns_have_no_spread() {
        let m = risk_metrics(&[0.003; 10], 0.95).unwrap();
        assert_relative_eq!(m.volatility, 0.0, epsilon = 1e-15);
        assert_relative_eq!(m.var, 0.003, epsilon = 1e-15);
        assert_relative_eq!(m.cvar, 0.003, epsilon = 1e-15);
    }
}
