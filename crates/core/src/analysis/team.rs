use crate::analysis::analyzer::Analyzer;
use crate::analysis::correlation::correlate;
use crate::domain::snapshot::AssetSnapshot;
use crate::domain::team::{SectorShare, TeamSnapshot};
use crate::error::{AnalyzeError, Result};
use crate::numeric::round_dp;
use crate::scoring::metrics::{Metric, Scorecard};
use std::sync::Arc;

impl Analyzer {
    /// Aggregates a team of tickers. Members that fail to resolve are skipped.
    pub async fn analyze_team<S: AsRef<str>>(&self, tickers: &[S]) -> Result<TeamSnapshot> {
        let mut members = Vec::with_capacity(tickers.len());

        for ticker in tickers {
            let ticker = ticker.as_ref();
            match self.analyze(ticker).await {
                Ok(snapshot) => members.push(snapshot),
                Err(e) => {
                    tracing::warn!(%ticker, error = %e, "skipping team member");
                }
            }
        }

        if members.is_empty() {
            return Err(AnalyzeError::InvalidArgument(
                "No valid stocks found for team".to_string(),
            ));
        }

        let team_stats = average_scorecards(&members);
        let team_composition = sector_composition(&members);
        let risk_analysis = correlate(&members);

        tracing::info!(
            requested = tickers.len(),
            members = members.len(),
            correlated = risk_analysis.tickers.len(),
            "team analyzed"
        );

        Ok(TeamSnapshot {
            member_count: members.len(),
            team_members: members,
            team_stats,
            team_composition,
            risk_analysis,
        })
    }
}

/// Per-metric mean across members, truncated toward zero.
pub fn average_scorecards(members: &[Arc<AssetSnapshot>]) -> Scorecard {
    let mut card = Scorecard::default();
    if members.is_empty() {
        return card;
    }

    let n = members.len() as u32;
    for metric in Metric::ALL {
        let total: u32 = members.iter().map(|m| u32::from(m.stats.get(metric))).sum();
        // Mean of u8 values always fits.
        card.set(metric, (total / n) as u8);
    }
    card
}

/// Sector counts in first-seen order, then stably sorted by count descending.
pub fn sector_composition(members: &[Arc<AssetSnapshot>]) -> Vec<SectorShare> {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for member in members {
        match counts.iter_mut().find(|(sector, _)| *sector == member.sector) {
            Some((_, count)) => *count += 1,
            None => counts.push((member.sector.as_str(), 1)),
        }
    }

    let total = members.len() as f64;
    let mut shares: Vec<SectorShare> = counts
        .into_iter()
        .map(|(sector, count)| SectorShare {
            sector: sector.to_string(),
            count,
            percentage: round_dp(count as f64 / total * 100.0, 1),
        })
        .collect();

    shares.sort_by(|a, b| b.count.cmp(&a.count));
    shares
}
