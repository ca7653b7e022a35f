use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Raw per-ticker fields as reported by a market data provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TickerRecord {
    pub symbol: Option<String>,
    pub short_name: Option<String>,
    pub logo_url: Option<String>,
    pub industry: Option<String>,
    pub sector: Option<String>,
    pub currency: Option<String>,
    pub current_price: Option<f64>,

    pub current_ratio: Option<f64>,
    pub revenue_growth: Option<f64>,
    pub profit_margins: Option<f64>,
    pub gross_margins: Option<f64>,
    pub debt_to_equity: Option<f64>,
    pub beta: Option<f64>,

    pub market_cap: Option<f64>,
    pub trailing_pe: Option<f64>,
    pub dividend_yield: Option<f64>,
    pub fifty_two_week_high: Option<f64>,
    pub fifty_two_week_low: Option<f64>,
    pub average_volume: Option<f64>,

    pub history: Vec<DailyClose>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyClose {
    pub date: NaiveDate,
    pub close: f64,
}
