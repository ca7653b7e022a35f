use crate::analysis::correlation::daily_returns;
use crate::analysis::risk::{risk_metrics, RiskMetrics};
use crate::cache::{LruSnapshotCache, SnapshotCache};
use crate::config::Settings;
use crate::domain::snapshot::AssetSnapshot;
use crate::error::{AnalyzeError, Result};
use crate::ingest::provider::{MarketDataProvider, YahooFinanceProvider};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Single-asset lookups backed by a provider and a shared snapshot cache.
pub struct Analyzer {
    provider: Arc<dyn MarketDataProvider>,
    cache: Arc<dyn SnapshotCache>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskReport {
    pub ticker: String,
    #[serde(flatten)]
    pub metrics: RiskMetrics,
    pub returns: Vec<f64>,
}

impl Analyzer {
    pub fn new(provider: Arc<dyn MarketDataProvider>, cache: Arc<dyn SnapshotCache>) -> Self {
        Self { provider, cache }
    }

    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let provider = YahooFinanceProvider::from_settings(settings)?;
        let cache = LruSnapshotCache::new(settings.lookup_cache_capacity);
        Ok(Self::new(Arc::new(provider), Arc::new(cache)))
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.provider_name()
    }

    pub async fn analyze(&self, ticker: &str) -> Result<Arc<AssetSnapshot>> {
        let ticker = normalize_ticker(ticker)?;

        if let Some(hit) = self.cache.get(&ticker).await {
            tracing::debug!(%ticker, "snapshot cache hit");
            return Ok(hit);
        }

        tracing::info!(%ticker, provider = self.provider.provider_name(), "fetching ticker");
        let record = self.provider.fetch_ticker(&ticker).await?;
        let snapshot = Arc::new(AssetSnapshot::from_record(&ticker, &record));

        self.cache.insert(ticker, snapshot.clone()).await;
        Ok(snapshot)
    }

    /// VaR/CVaR over the daily returns of one ticker's price history.
    pub async fn risk_report(&self, ticker: &str, confidence_level: f64) -> Result<RiskReport> {
        let snapshot = self.analyze(ticker).await?;
        let returns = daily_returns(&snapshot.history);
        let metrics = risk_metrics(&returns, confidence_level)?;

        Ok(RiskReport {
            ticker: snapshot.ticker.clone(),
            metrics,
            returns,
        })
    }
}

pub fn normalize_ticker(ticker: &str) -> Result<String> {
    let ticker = ticker.trim();
    if ticker.is_empty() {
        return Err(AnalyzeError::InvalidArgument(
            "ticker must be non-empty".to_string(),
        ));
    }
    Ok(ticker.to_uppercase())
}
