use crate::domain::snapshot::{AssetSnapshot, PricePoint};
use crate::numeric::round_dp;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Pairwise return correlations. Serializes as `{}` when empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CorrelationResult {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tickers: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub matrix: Vec<Vec<f64>>,
}

impl CorrelationResult {
    pub fn is_empty(&self) -> bool {
        self.tickers.is_empty()
    }
}

/// Correlates daily returns across every snapshot that has price history.
///
/// Series are inner-joined on date before returns are taken. Anything that
/// leaves fewer than two series or no usable return rows yields an empty
/// result instead of an error.
pub fn correlate(snapshots: &[Arc<AssetSnapshot>]) -> CorrelationResult {
    let series: Vec<(&str, BTreeMap<NaiveDate, f64>)> = snapshots
        .iter()
        .filter(|s| !s.history.is_empty())
        .map(|s| {
            let prices = s.history.iter().map(|p| (p.date, p.price)).collect();
            (s.ticker.as_str(), prices)
        })
        .collect();

    if series.len() < 2 {
        tracing::debug!(series = series.len(), "not enough price series to correlate");
        return CorrelationResult::default();
    }

    let common_dates: Vec<NaiveDate> = series[0]
        .1
        .keys()
        .filter(|d| series[1..].iter().all(|(_, prices)| prices.contains_key(*d)))
        .copied()
        .collect();

    if common_dates.is_empty() {
        tracing::debug!("price series share no trading dates");
        return CorrelationResult::default();
    }

    let aligned: Vec<Vec<f64>> = series
        .iter()
        .map(|(_, prices)| common_dates.iter().map(|d| prices[d]).collect())
        .collect();

    let columns = aligned_returns(&aligned);
    let rows = columns.first().map_or(0, Vec::len);
    if rows == 0 {
        tracing::debug!(dates = common_dates.len(), "no usable return rows after alignment");
        return CorrelationResult::default();
    }

    let n = columns.len();
    let mut matrix = vec![vec![0.0; n]; n];
    for i in 0..n {
        matrix[i][i] = 1.0;
        for j in (i + 1)..n {
            let r = pearson(&columns[i], &columns[j]);
            let cell = if r.is_finite() { round_dp(r, 2) } else { 0.0 };
            matrix[i][j] = cell;
            matrix[j][i] = cell;
        }
    }

    CorrelationResult {
        tickers: series.iter().map(|(t, _)| t.to_string()).collect(),
        matrix,
    }
}

/// Day-over-day percentage change of one price series. Non-finite changes
/// (a zero prior close) are skipped.
pub fn daily_returns(history: &[PricePoint]) -> Vec<f64> {
    history
        .windows(2)
        .map(|w| w[1].price / w[0].price - 1.0)
        .filter(|r| r.is_finite())
        .collect()
}

// Returns one column per input series. The first row has no prior day, and a
// row is dropped entirely when any of its changes is non-finite.
fn aligned_returns(aligned: &[Vec<f64>]) -> Vec<Vec<f64>> {
    let len = aligned.first().map_or(0, Vec::len);
    let mut columns = vec![Vec::with_capacity(len.saturating_sub(1)); aligned.len()];

    for t in 1..len {
        let row: Vec<f64> = aligned
            .iter()
            .map(|prices| prices[t] / prices[t - 1] - 1.0)
            .collect();
        if row.iter().all(|r| r.is_finite()) {
            for (col, r) in columns.iter_mut().zip(row) {
                col.push(r);
            }
        }
    }

    columns
}

// NaN when undefined (fewer than two rows or a constant column).
fn pearson(a: &[f64], b: &[f64]) -> f64 {
    let n = a.len().min(b.len());
    if n < 2 {
        return f64::NAN;
    }

    let mean_a = a[..n].iter().sum::<f64>() / n as f64;
    let mean_b = b[..n].iter().sum::<f64>() / n as f64;

    let mut cov = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for (x, y) in a[..n].iter().zip(&b[..n]) {
        let da = x - mean_a;
        let db = y - mean_b;
        cov += da * db;
        var_a += da * da;
        var_b += db * db;
    }

    cov / (var_a * var_b).sqrt()
}
