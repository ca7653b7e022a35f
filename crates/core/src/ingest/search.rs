use crate::config::Settings;
use crate::ingest::provider::USER_AGENT;
use anyhow::Context;
use serde::{Deserialize, Serialize};

pub const MAX_SEARCH_RESULTS: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub symbol: String,
    pub shortname: String,
}

/// Ticker autocomplete.
#[async_trait::async_trait]
pub trait TickerSearch: Send + Sync {
    async fn search(&self, query: &str) -> anyhow::Result<Vec<SearchHit>>;
}

#[derive(Debug, Clone)]
pub struct YahooSearch {
    http: reqwest::Client,
    base_url: String,
}

impl YahooSearch {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(settings.upstream_timeout)
            .user_agent(USER_AGENT)
            .build()
            .context("failed to build search http client")?;

        Ok(Self {
            http,
            base_url: settings.search_base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait::async_trait]
impl TickerSearch for YahooSearch {
    async fn search(&self, query: &str) -> anyhow::Result<Vec<SearchHit>> {
        let url = format!("{}/v1/finance/search", self.base_url);
        let res = self
            .http
            .get(url)
            .query(&[("q", query)])
            .send()
            .await
            .context("search request failed")?;

        let status = res.status();
        let text = res.text().await.context("failed to read search response")?;
        if !status.is_success() {
            anyhow::bail!("search HTTP {status}: {text}");
        }

        parse_search_response(&text)
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    quotes: Vec<SearchQuote>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchQuote {
    #[serde(default)]
    symbol: Option<String>,
    #[serde(default, rename = "shortname")]
    short_name: Option<String>,
    #[serde(default, rename = "longname")]
    long_name: Option<String>,
    #[serde(default)]
    is_yahoo_finance: bool,
}

/// Keeps ticker quotes only (entries flagged `isYahooFinance` are skipped),
/// capped at [`MAX_SEARCH_RESULTS`].
pub fn parse_search_response(text: &str) -> anyhow::Result<Vec<SearchHit>> {
    let body = serde_json::from_str::<SearchResponse>(text)
        .with_context(|| format!("search response is not valid JSON: {text}"))?;

    Ok(body
        .quotes
        .into_iter()
        .filter(|q| !q.is_yahoo_finance)
        .filter_map(|q| {
            let symbol = q.symbol.filter(|s| !s.is_empty())?;
            let shortname = q.short_name.or(q.long_name).unwrap_or_default();
            Some(SearchHit { symbol, shortname })
        })
        .take(MAX_SEARCH_RESULTS)
        .collect())
}
