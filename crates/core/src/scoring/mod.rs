//! Piecewise-linear mapping of raw financial ratios onto a bounded 0-100 score.
//!
//! Every metric is calibrated with three pivots (`low < mid < high`) and the
//! score each pivot should receive. Between pivots the score is linearly
//! interpolated; outside them it is held flat, except below `low` in the
//! standard orientation where it ramps from (0, 0).

pub mod metrics;

use crate::error::{AnalyzeError, Result};
use serde::{Deserialize, Serialize};

pub const MIN_SCORE: f64 = 0.0;
pub const MAX_SCORE: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    /// Higher raw values score higher.
    Standard,
    /// Lower raw values score higher (leverage style metrics).
    Inverse,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricBreakpoints {
    pub low: f64,
    pub mid: f64,
    pub high: f64,
    pub points_low: f64,
    pub points_mid: f64,
    pub points_high: f64,
    pub orientation: Orientation,
}

impl MetricBreakpoints {
    pub const fn standard(low: f64, mid: f64, high: f64, points: [f64; 3]) -> Self {
        Self {
            low,
            mid,
            high,
            points_low: points[0],
            points_mid: points[1],
            points_high: points[2],
            orientation: Orientation::Standard,
        }
    }

    /// Inverse pivots with the default 100/50/10 scale: `points_low` is awarded
    /// at or below `low`, `points_high` at or above `high`.
    pub const fn inverse(low: f64, mid: f64, high: f64) -> Self {
        Self {
            low,
            mid,
            high,
            points_low: 100.0,
            points_mid: 50.0,
            points_high: 10.0,
            orientation: Orientation::Inverse,
        }
    }

    pub const fn with_points(mut self, points: [f64; 3]) -> Self {
        self.points_low = points[0];
        self.points_mid = points[1];
        self.points_high = points[2];
        self
    }

    pub fn validate(&self) -> Result<()> {
        let ordered = self.low < self.mid && self.mid < self.high;
        if !ordered {
            return Err(AnalyzeError::InvalidArgument(format!(
                "breakpoints must satisfy low < mid < high (got {} / {} / {})",
                self.low, self.mid, self.high
            )));
        }

        for p in [self.points_low, self.points_mid, self.points_high] {
            if !(MIN_SCORE..=MAX_SCORE).contains(&p) {
                return Err(AnalyzeError::InvalidArgument(format!(
                    "breakpoint points must be within [0, 100] (got {p})"
                )));
            }
        }

        Ok(())
    }
}

/// Scores `value` against `bp`. Absent (or NaN) values score 0.
pub fn score(value: Option<f64>, bp: &MetricBreakpoints) -> u8 {
    let Some(value) = value.filter(|v| !v.is_nan()) else {
        return 0;
    };

    let raw = match bp.orientation {
        Orientation::Standard => standard_piece(value, bp),
        Orientation::Inverse => inverse_piece(value, bp),
    };

    // NaN only appears for degenerate pivots; `as` maps it to 0.
    raw.clamp(MIN_SCORE, MAX_SCORE) as u8
}

fn standard_piece(v: f64, bp: &MetricBreakpoints) -> f64 {
    if v < bp.low {
        // Ramp from the origin, never past points_low (a negative `low` would overshoot).
        interp(v, 0.0, 0.0, bp.low, bp.points_low).min(bp.points_low)
    } else if v <= bp.low {
        bp.points_low
    } else if v <= bp.mid {
        interp(v, bp.low, bp.points_low, bp.mid, bp.points_mid)
    } else if v <= bp.high {
        interp(v, bp.mid, bp.points_mid, bp.high, bp.points_high)
    } else {
        bp.points_high
    }
}

fn inverse_piece(v: f64, bp: &MetricBreakpoints) -> f64 {
    if v >= bp.high {
        bp.points_high
    } else if v >= bp.mid {
        interp(v, bp.mid, bp.points_mid, bp.high, bp.points_high)
    } else if v >= bp.low {
        interp(v, bp.low, bp.points_low, bp.mid, bp.points_mid)
    } else {
        bp.points_low
    }
}

fn interp(v: f64, x1: f64, y1: f64, x2: f64, y2: f64) -> f64 {
    if x2 == x1 {
        return y1;
    }
    y1 + (y2 - y1) * ((v - x1) / (x2 - x1))
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIQUIDITY: MetricBreakpoints =
        MetricBreakpoints::standard(0.5, 1.5, 3.0, [20.0, 70.0, 100.0]);
    const SOLVENCY: MetricBreakpoints = MetricBreakpoints::inverse(0.0, 100.0, 200.0);

    fn sweep(from: f64, to: f64, steps: usize) -> impl Iterator<Item = f64> {
        (0..=steps).map(move |i| from + (to - from) * (i as f64) / (steps as f64))
    }

    #[test]
    fn documented_examples() {
        assert_eq!(score(Some(1.5), &LIQUIDITY), 70);
        assert_eq!(score(Some(0.0), &LIQUIDITY), 0);
        assert_eq!(score(Some(3.5), &LIQUIDITY), 100);
    }

    #[test]
    fn missing_value_scores_zero() {
        assert_eq!(score(None, &LIQUIDITY), 0);
        assert_eq!(score(None, &SOLVENCY), 0);
        assert_eq!(score(Some(f64::NAN), &LIQUIDITY), 0);
    }

    #[test]
    fn standard_boundaries_are_inclusive() {
        assert_eq!(score(Some(0.5), &LIQUIDITY), 20);
        assert_eq!(score(Some(3.0), &LIQUIDITY), 100);
        // Just below low ramps from the origin.
        assert_eq!(score(Some(0.25), &LIQUIDITY), 10);
        // Halfway between pivots.
        assert_eq!(score(Some(1.0), &LIQUIDITY), 45);
        assert_eq!(score(Some(2.25), &LIQUIDITY), 85);
    }

    #[test]
    fn interpolated_scores_truncate() {
        assert_eq!(score(Some(1.6), &LIQUIDITY), 72);
        // 44.5
        assert_eq!(score(Some(0.99), &LIQUIDITY), 44);
    }

    #[test]
    fn low_pivot_at_zero_floors_negative_values() {
        let growth = MetricBreakpoints::standard(0.0, 0.15, 0.40, [20.0, 70.0, 100.0]);
        assert_eq!(score(Some(-0.5), &growth), 0);
        assert_eq!(score(Some(0.0), &growth), 20);
        assert_eq!(score(Some(0.15), &growth), 70);
    }

    #[test]
    fn inverse_default_scale() {
        assert_eq!(score(Some(-5.0), &SOLVENCY), 100);
        assert_eq!(score(Some(0.0), &SOLVENCY), 100);
        assert_eq!(score(Some(50.0), &SOLVENCY), 75);
        assert_eq!(score(Some(100.0), &SOLVENCY), 50);
        assert_eq!(score(Some(150.0), &SOLVENCY), 30);
        assert_eq!(score(Some(200.0), &SOLVENCY), 10);
        assert_eq!(score(Some(1_000.0), &SOLVENCY), 10);
    }

    #[test]
    fn inverse_scale_is_configurable() {
        let bp = MetricBreakpoints::inverse(1.0, 2.0, 4.0).with_points([90.0, 40.0, 0.0]);
        assert_eq!(score(Some(0.5), &bp), 90);
        assert_eq!(score(Some(2.0), &bp), 40);
        assert_eq!(score(Some(3.0), &bp), 20);
        assert_eq!(score(Some(9.0), &bp), 0);
    }

    #[test]
    fn standard_is_monotonic_non_decreasing() {
        let configs = [
            LIQUIDITY,
            MetricBreakpoints::standard(0.05, 0.20, 0.40, [30.0, 75.0, 100.0]),
            MetricBreakpoints::standard(-1.0, 0.0, 1.0, [0.0, 1.0, 2.0]),
            MetricBreakpoints::standard(-1.0, 0.0, 1.0, [20.0, 50.0, 100.0]),
        ];
        for bp in configs {
            let mut prev = 0;
            for v in sweep(-10.0, 10.0, 4_000) {
                let s = score(Some(v), &bp);
                assert!(s >= prev, "score dropped at {v}: {s} < {prev}");
                prev = s;
            }
        }
    }

    #[test]
    fn negative_low_pivot_holds_points_low_below_it() {
        let bp = MetricBreakpoints::standard(-1.0, 0.0, 1.0, [20.0, 50.0, 100.0]);
        assert_eq!(score(Some(-10.0), &bp), 20);
        assert_eq!(score(Some(-2.0), &bp), 20);
        assert_eq!(score(Some(-1.0), &bp), 20);
        assert_eq!(score(Some(0.0), &bp), 50);

        let mut prev = 0;
        for v in sweep(-10.0, 10.0, 4_000) {
            let s = score(Some(v), &bp);
            assert!(s >= prev, "score dropped at {v}: {s} < {prev}");
            prev = s;
        }
    }

    #[test]
    fn inverse_is_monotonic_non_increasing() {
        let mut prev = u8::MAX;
        for v in sweep(-100.0, 400.0, 5_000) {
            let s = score(Some(v), &SOLVENCY);
            assert!(s <= prev, "score rose at {v}: {s} > {prev}");
            prev = s;
        }
    }

    #[test]
    fn mid_pivot_scores_points_mid() {
        let pivots = [(0.1, 0.2, 0.3), (-5.0, 0.0, 5.0), (10.0, 1_000.0, 1_000_000.0)];
        for (low, mid, high) in pivots {
            let bp = MetricBreakpoints::standard(low, mid, high, [10.0, 55.0, 90.0]);
            assert_eq!(score(Some(mid), &bp), 55);
            let inv = MetricBreakpoints::inverse(low, mid, high);
            assert_eq!(score(Some(mid), &inv), 50);
        }
    }

    #[test]
    fn scores_stay_in_range_for_extreme_inputs() {
        let wild = MetricBreakpoints::standard(0.5, 1.0, 2.0, [0.0, 100.0, 100.0]);
        for v in [
            f64::MIN,
            -1e300,
            -1.0,
            0.0,
            1e-12,
            1e300,
            f64::MAX,
            f64::INFINITY,
            f64::NEG_INFINITY,
        ] {
            for bp in [&LIQUIDITY, &SOLVENCY, &wild] {
                let s = score(Some(v), bp);
                assert!(s <= 100, "{v} scored {s}");
            }
        }
    }

    #[test]
    fn validate_rejects_unordered_pivots_and_bad_points() {
        assert!(LIQUIDITY.validate().is_ok());
        assert!(SOLVENCY.validate().is_ok());
        assert!(MetricBreakpoints::standard(1.0, 1.0, 2.0, [0.0, 1.0, 2.0])
            .validate()
            .is_err());
        assert!(MetricBreakpoints::standard(0.0, 1.0, 2.0, [0.0, 50.0, 120.0])
            .validate()
            .is_err());
    }
}
