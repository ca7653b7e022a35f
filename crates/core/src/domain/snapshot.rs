use crate::ingest::types::{DailyClose, TickerRecord};
use crate::numeric::round_dp;
use crate::scoring::metrics::Scorecard;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const UNKNOWN_LABEL: &str = "Unknown";
pub const DEFAULT_CURRENCY: &str = "USD";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetSnapshot {
    pub ticker: String,
    pub name: Option<String>,
    pub logo_url: String,
    /// Industry classification.
    pub category: String,
    pub sector: String,
    pub stats: Scorecard,
    pub raw_stats: RawStats,
    pub history: Vec<PricePoint>,
    pub current_price: Option<f64>,
    pub currency: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawStats {
    pub market_cap: Option<u64>,
    pub pe_ratio: Option<f64>,
    pub dividend_yield: Option<f64>,
    pub fifty_two_week_high: Option<f64>,
    pub fifty_two_week_low: Option<f64>,
    pub avg_volume: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub price: f64,
}

impl AssetSnapshot {
    /// Builds the snapshot for an already-normalized ticker.
    pub fn from_record(ticker: &str, record: &TickerRecord) -> Self {
        let label = |v: &Option<String>| {
            v.as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .unwrap_or(UNKNOWN_LABEL)
                .to_string()
        };

        Self {
            ticker: record
                .symbol
                .clone()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| ticker.to_string()),
            name: record.short_name.clone(),
            logo_url: record.logo_url.clone().unwrap_or_default(),
            category: label(&record.industry),
            sector: label(&record.sector),
            stats: Scorecard::from_record(record),
            raw_stats: RawStats::from_record(record),
            history: price_history(&record.history),
            current_price: record.current_price,
            currency: record
                .currency
                .clone()
                .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
        }
    }
}

impl RawStats {
    fn from_record(record: &TickerRecord) -> Self {
        Self {
            market_cap: record.market_cap.and_then(whole),
            pe_ratio: record.trailing_pe,
            dividend_yield: record.dividend_yield,
            fifty_two_week_high: record.fifty_two_week_high,
            fifty_two_week_low: record.fifty_two_week_low,
            avg_volume: record.average_volume.and_then(whole),
        }
    }
}

fn whole(v: f64) -> Option<u64> {
    (v.is_finite() && v >= 0.0).then(|| v as u64)
}

/// Ascending by date; a repeated date keeps the last close seen. Non-finite
/// closes are dropped.
pub fn price_history(closes: &[DailyClose]) -> Vec<PricePoint> {
    let by_date: BTreeMap<NaiveDate, f64> = closes
        .iter()
        .filter(|c| c.close.is_finite())
        .map(|c| (c.date, c.close))
        .collect();

    by_date
        .into_iter()
        .map(|(date, close)| PricePoint {
            date,
            price: round_dp(close, 2),
        })
        .collect()
}
