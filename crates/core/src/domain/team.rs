use crate::analysis::correlation::CorrelationResult;
use crate::domain::snapshot::AssetSnapshot;
use crate::scoring::metrics::Scorecard;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamSnapshot {
    pub team_members: Vec<Arc<AssetSnapshot>>,
    pub team_stats: Scorecard,
    pub team_composition: Vec<SectorShare>,
    pub member_count: usize,
    pub risk_analysis: CorrelationResult,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorShare {
    pub sector: String,
    pub count: usize,
    /// Share of the valid members, in percent with one decimal.
    pub percentage: f64,
}
