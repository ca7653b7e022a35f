use super::{score, MetricBreakpoints};
use crate::ingest::types::TickerRecord;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Market-neutral beta assumed when the provider reports none.
pub const DEFAULT_BETA: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Metric {
    Liquidity,
    Growth,
    Profitability,
    Innovation,
    Solvency,
    Volatility,
}

impl Metric {
    pub const ALL: [Metric; 6] = [
        Metric::Liquidity,
        Metric::Growth,
        Metric::Profitability,
        Metric::Innovation,
        Metric::Solvency,
        Metric::Volatility,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Metric::Liquidity => "Liquidity",
            Metric::Growth => "Growth",
            Metric::Profitability => "Profitability",
            Metric::Innovation => "Innovation",
            Metric::Solvency => "Solvency",
            Metric::Volatility => "Volatility",
        }
    }

    pub fn breakpoints(self) -> &'static MetricBreakpoints {
        match self {
            Metric::Liquidity => &LIQUIDITY,
            Metric::Growth => &GROWTH,
            Metric::Profitability => &PROFITABILITY,
            Metric::Innovation => &INNOVATION,
            Metric::Solvency => &SOLVENCY,
            Metric::Volatility => &VOLATILITY,
        }
    }

    /// Raw provider value feeding this metric, with the missing-field default applied.
    pub fn raw_value(self, record: &TickerRecord) -> f64 {
        match self {
            Metric::Liquidity => record.current_ratio.unwrap_or(0.0),
            Metric::Growth => record.revenue_growth.unwrap_or(0.0),
            Metric::Profitability => record.profit_margins.unwrap_or(0.0),
            Metric::Innovation => record.gross_margins.unwrap_or(0.0),
            Metric::Solvency => record.debt_to_equity.unwrap_or(0.0),
            Metric::Volatility => record.beta.unwrap_or(DEFAULT_BETA),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// Current ratio.
pub const LIQUIDITY: MetricBreakpoints =
    MetricBreakpoints::standard(0.5, 1.5, 3.0, [20.0, 70.0, 100.0]);
// Revenue growth as a fraction (0.15 == 15%).
pub const GROWTH: MetricBreakpoints =
    MetricBreakpoints::standard(0.0, 0.15, 0.40, [20.0, 70.0, 100.0]);
// Profit margin.
pub const PROFITABILITY: MetricBreakpoints =
    MetricBreakpoints::standard(0.05, 0.20, 0.40, [30.0, 75.0, 100.0]);
// Gross margin.
pub const INNOVATION: MetricBreakpoints =
    MetricBreakpoints::standard(0.10, 0.40, 0.70, [20.0, 70.0, 100.0]);
// Debt to equity, quoted in percent by the provider (150 == 1.5x).
pub const SOLVENCY: MetricBreakpoints = MetricBreakpoints::inverse(0.0, 100.0, 200.0);
// Beta. Higher beta scores higher.
pub const VOLATILITY: MetricBreakpoints =
    MetricBreakpoints::standard(0.5, 1.0, 2.0, [20.0, 50.0, 100.0]);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scorecard {
    #[serde(rename = "Liquidity")]
    pub liquidity: u8,
    #[serde(rename = "Growth")]
    pub growth: u8,
    #[serde(rename = "Profitability")]
    pub profitability: u8,
    #[serde(rename = "Innovation")]
    pub innovation: u8,
    #[serde(rename = "Solvency")]
    pub solvency: u8,
    #[serde(rename = "Volatility")]
    pub volatility: u8,
}

impl Scorecard {
    pub fn from_record(record: &TickerRecord) -> Self {
        let mut card = Self::default();
        for metric in Metric::ALL {
            let raw = metric.raw_value(record);
            card.set(metric, score(Some(raw), metric.breakpoints()));
        }
        card
    }

    pub fn get(&self, metric: Metric) -> u8 {
        match metric {
            Metric::Liquidity => self.liquidity,
            Metric::Growth => self.growth,
            Metric::Profitability => self.profitability,
            Metric::Innovation => self.innovation,
            Metric::Solvency => self.solvency,
            Metric::Volatility => self.volatility,
        }
    }

    pub fn set(&mut self, metric: Metric, value: u8) {
        let slot = match metric {
            Metric::Liquidity => &mut self.liquidity,
            Metric::Growth => &mut self.growth,
            Metric::Profitability => &mut self.profitability,
            Metric::Innovation => &mut self.innovation,
            Metric::Solvency => &mut self.solvency,
            Metric::Volatility => &mut self.volatility,
        };
        *slot = value;
    }

    pub fn iter(&self) -> impl Iterator<Item = (Metric, u8)> + '_ {
        Metric::ALL.into_iter().map(move |m| (m, self.get(m)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn fixed_breakpoints_are_valid() {
        for metric in Metric::ALL {
            metric.breakpoints().validate().unwrap();
        }
    }

    #[test]
    fn empty_record_uses_field_defaults() {
        let card = Scorecard::from_record(&TickerRecord::default());
        assert_eq!(card.liquidity, 0);
        // Growth pivots start at 0.0, so a defaulted 0 lands on points_low.
        assert_eq!(card.growth, 20);
        assert_eq!(card.profitability, 0);
        assert_eq!(card.innovation, 0);
        // No reported debt is the best possible solvency.
        assert_eq!(card.solvency, 100);
        // Beta defaults to 1.0.
        assert_eq!(card.volatility, 50);
    }

    #[test]
    fn scores_a_typical_large_cap() {
        let record = TickerRecord {
            current_ratio: Some(1.5),
            revenue_growth: Some(0.40),
            profit_margins: Some(0.20),
            gross_margins: Some(0.70),
            debt_to_equity: Some(150.0),
            beta: Some(2.5),
            ..TickerRecord::default()
        };
        let card = Scorecard::from_record(&record);
        assert_eq!(
            card,
            Scorecard {
                liquidity: 70,
                growth: 100,
                profitability: 75,
                innovation: 100,
                solvency: 30,
                volatility: 100,
            }
        );
    }

    #[test]
    fn serializes_with_metric_labels() {
        let card = Scorecard {
            liquidity: 1,
            growth: 2,
            profitability: 3,
            innovation: 4,
            solvency: 5,
            volatility: 6,
        };
        assert_eq!(
            serde_json::to_value(card).unwrap(),
            json!({
                "Liquidity": 1,
                "Growth": 2,
                "Profitability": 3,
                "Innovation": 4,
                "Solvency": 5,
                "Volatility": 6,
            })
        );
    }

    #[test]
    fn get_and_set_cover_every_metric() {
        let mut card = Scorecard::default();
        for (i, metric) in Metric::ALL.into_iter().enumerate() {
            card.set(metric, i as u8 * 10);
        }
        let values: Vec<u8> = card.iter().map(|(_, v)| v).collect();
        assert_eq!(values, vec![0, 10, 20, 30, 40, 50]);
    }
}
