use crate::error::{AnalyzeError, Result};
use crate::ingest::provider::MarketDataProvider;
use crate::ingest::types::TickerRecord;
use anyhow::Context;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Provider serving fixed records, keyed by uppercase symbol.
///
/// Backs the offline CLI mode (`--fixture`) and tests. Symbols registered
/// with [`InMemoryProvider::with_failure`] answer with an upstream error.
#[derive(Debug, Default)]
pub struct InMemoryProvider {
    records: HashMap<String, TickerRecord>,
    failing: HashSet<String>,
    fetches: AtomicUsize,
}

impl InMemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(mut self, symbol: &str, record: TickerRecord) -> Self {
        self.records.insert(symbol.to_uppercase(), record);
        self
    }

    pub fn with_failure(mut self, symbol: &str) -> Self {
        self.failing.insert(symbol.to_uppercase());
        self
    }

    /// Loads a JSON object mapping symbols to records.
    pub fn from_json_str(text: &str) -> anyhow::Result<Self> {
        let records = serde_json::from_str::<HashMap<String, TickerRecord>>(text)
            .context("fixture is not a JSON object of ticker records")?;
        Ok(records
            .into_iter()
            .fold(Self::new(), |p, (symbol, record)| p.with_record(&symbol, record)))
    }

    pub fn from_json_file(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read fixture {}", path.display()))?;
        Self::from_json_str(&text)
    }

    /// Number of `fetch_ticker` calls served so far.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl MarketDataProvider for InMemoryProvider {
    fn provider_name(&self) -> &'static str {
        "in_memory"
    }

    async fn fetch_ticker(&self, symbol: &str) -> Result<TickerRecord> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let key = symbol.to_uppercase();

        if self.failing.contains(&key) {
            return Err(anyhow::anyhow!("simulated upstream failure for {key}").into());
        }

        self.records
            .get(&key)
            .cloned()
            .ok_or_else(|| AnalyzeError::not_found(&key))
    }
}
