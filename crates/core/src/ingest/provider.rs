use crate::config::Settings;
use crate::error::{AnalyzeError, Result};
use crate::ingest::types::{DailyClose, TickerRecord};
use anyhow::Context;
use chrono::DateTime;
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;

const QUOTE_SUMMARY_MODULES: &str =
    "price,summaryDetail,financialData,defaultKeyStatistics,assetProfile";
const HISTORY_RANGE: &str = "1y";
const HISTORY_INTERVAL: &str = "1d";
pub(crate) const USER_AGENT: &str = "Mozilla/5.0";

#[async_trait::async_trait]
pub trait MarketDataProvider: Send + Sync {
    fn provider_name(&self) -> &'static str;

    /// Fetches metadata, fundamentals and a year of daily closes for an
    /// uppercase symbol. `NotFound` when the provider has no such symbol.
    async fn fetch_ticker(&self, symbol: &str) -> Result<TickerRecord>;
}

#[derive(Debug)]
pub struct YahooFinanceProvider {
    http: reqwest::Client,
    base_url: String,
    session_url: String,
    attempts: u32,

    // Quote summary requests need a crumb bound to the session cookie.
    crumb_cache: tokio::sync::Mutex<Option<String>>,
}

impl YahooFinanceProvider {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(settings.upstream_timeout)
            .cookie_store(true)
            .user_agent(USER_AGENT)
            .build()
            .context("failed to build market data http client")?;

        Ok(Self {
            http,
            base_url: settings.market_data_base_url.trim_end_matches('/').to_string(),
            session_url: settings.market_data_session_url.clone(),
            attempts: settings.upstream_attempts.max(1),
            crumb_cache: tokio::sync::Mutex::new(None),
        })
    }

    async fn get_crumb_cached(&self) -> anyhow::Result<String> {
        let mut guard = self.crumb_cache.lock().await;
        if let Some(crumb) = guard.as_ref() {
            return Ok(crumb.clone());
        }

        let crumb = self.fetch_crumb().await?;
        *guard = Some(crumb.clone());
        Ok(crumb)
    }

    async fn invalidate_crumb(&self) {
        *self.crumb_cache.lock().await = None;
    }

    async fn fetch_crumb(&self) -> anyhow::Result<String> {
        // The session endpoint answers 404 but sets the cookie the crumb is tied to.
        let _ = self
            .http
            .get(&self.session_url)
            .send()
            .await
            .context("market data session request failed")?;

        let url = format!("{}/v1/test/getcrumb", self.base_url);
        let (status, text) = self.get_text(&url, &[]).await?;
        if !status.is_success() || text.trim().is_empty() {
            anyhow::bail!("market data crumb HTTP {status}: {text}");
        }
        Ok(text.trim().to_string())
    }

    /// GET with bounded attempts; only transport errors, 429 and 5xx are retried.
    async fn get_text(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> anyhow::Result<(StatusCode, String)> {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;

            let res = self.http.get(url).query(query).send().await;
            let res = match res {
                Ok(r) => r,
                Err(err) => {
                    if attempt >= self.attempts {
                        return Err(err).with_context(|| format!("request to {url} failed"));
                    }
                    let backoff = Duration::from_secs(1 << (attempt - 1).min(5));
                    tracing::warn!(attempt, ?backoff, error = %err, "market data request failed; retrying");
                    tokio::time::sleep(backoff).await;
                    continue;
                }
            };

            let status = res.status();
            let retryable = status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error();
            if retryable && attempt < self.attempts {
                let backoff = Duration::from_secs(1 << (attempt - 1).min(5));
                tracing::warn!(attempt, ?backoff, http_status = %status, "market data HTTP error; retrying");
                tokio::time::sleep(backoff).await;
                continue;
            }

            let text = res
                .text()
                .await
                .context("failed to read market data response")?;
            return Ok((status, text));
        }
    }

    async fn fetch_summary(&self, symbol: &str) -> Result<TickerRecord> {
        let url = format!("{}/v10/finance/quoteSummary/{symbol}", self.base_url);

        let mut refreshed = false;
        loop {
            let crumb = self.get_crumb_cached().await?;
            let query = [("modules", QUOTE_SUMMARY_MODULES), ("crumb", crumb.as_str())];
            let (status, text) = self.get_text(&url, &query).await?;

            if (status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN) && !refreshed {
                tracing::debug!(%symbol, http_status = %status, "crumb rejected; refreshing session");
                self.invalidate_crumb().await;
                refreshed = true;
                continue;
            }
            if status == StatusCode::NOT_FOUND {
                return Err(AnalyzeError::not_found(symbol));
            }
            if !status.is_success() {
                return Err(anyhow::anyhow!("quote summary HTTP {status}: {text}").into());
            }

            return parse_quote_summary(symbol, &text);
        }
    }

    async fn fetch_history(&self, symbol: &str) -> anyhow::Result<Vec<DailyClose>> {
        let url = format!("{}/v8/finance/chart/{symbol}", self.base_url);
        let query = [("range", HISTORY_RANGE), ("interval", HISTORY_INTERVAL)];
        let (status, text) = self.get_text(&url, &query).await?;
        if !status.is_success() {
            anyhow::bail!("chart HTTP {status}: {text}");
        }
        parse_chart(&text)
    }
}

#[async_trait::async_trait]
impl MarketDataProvider for YahooFinanceProvider {
    fn provider_name(&self) -> &'static str {
        "yahoo_finance"
    }

    async fn fetch_ticker(&self, symbol: &str) -> Result<TickerRecord> {
        let mut record = self.fetch_summary(symbol).await?;

        // Missing history degrades to an empty series rather than failing the lookup.
        match self.fetch_history(symbol).await {
            Ok(history) => record.history = history,
            Err(err) => {
                tracing::warn!(%symbol, error = %err, "price history unavailable; continuing without it");
            }
        }

        Ok(record)
    }
}

#[derive(Debug, Default, Deserialize)]
struct Raw {
    raw: Option<f64>,
}

fn raw(v: &Option<Raw>) -> Option<f64> {
    v.as_ref().and_then(|r| r.raw).filter(|x| x.is_finite())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteSummaryEnvelope {
    quote_summary: QuoteSummaryBody,
}

#[derive(Debug, Deserialize)]
struct QuoteSummaryBody {
    #[serde(default)]
    result: Option<Vec<QuoteSummaryResult>>,
    #[serde(default)]
    error: Option<ProviderError>,
}

#[derive(Debug, Deserialize)]
struct ProviderError {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct QuoteSummaryResult {
    price: Option<PriceModule>,
    summary_detail: Option<SummaryDetailModule>,
    financial_data: Option<FinancialDataModule>,
    default_key_statistics: Option<KeyStatisticsModule>,
    asset_profile: Option<AssetProfileModule>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct PriceModule {
    symbol: Option<String>,
    short_name: Option<String>,
    currency: Option<String>,
    regular_market_price: Option<Raw>,
    market_cap: Option<Raw>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct SummaryDetailModule {
    #[serde(rename = "trailingPE")]
    trailing_pe: Option<Raw>,
    dividend_yield: Option<Raw>,
    fifty_two_week_high: Option<Raw>,
    fifty_two_week_low: Option<Raw>,
    average_volume: Option<Raw>,
    market_cap: Option<Raw>,
    beta: Option<Raw>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct FinancialDataModule {
    current_price: Option<Raw>,
    current_ratio: Option<Raw>,
    revenue_growth: Option<Raw>,
    profit_margins: Option<Raw>,
    gross_margins: Option<Raw>,
    debt_to_equity: Option<Raw>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct KeyStatisticsModule {
    beta: Option<Raw>,
    profit_margins: Option<Raw>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AssetProfileModule {
    industry: Option<String>,
    sector: Option<String>,
    logo_url: Option<String>,
}

pub(crate) fn parse_quote_summary(symbol: &str, text: &str) -> Result<TickerRecord> {
    let envelope = serde_json::from_str::<QuoteSummaryEnvelope>(text)
        .with_context(|| format!("quote summary response is not valid JSON: {text}"))?;

    if let Some(err) = envelope.quote_summary.error {
        if err.code.as_deref() == Some("Not Found") {
            return Err(AnalyzeError::not_found(symbol));
        }
        return Err(anyhow::anyhow!(
            "quote summary error for {symbol}: {}",
            err.description.or(err.code).unwrap_or_default()
        )
        .into());
    }

    let Some(result) = envelope
        .quote_summary
        .result
        .and_then(|r| r.into_iter().next())
    else {
        return Err(AnalyzeError::not_found(symbol));
    };

    let price = result.price.unwrap_or_default();
    // A result without a symbol is how the provider reports an unknown ticker.
    let Some(provider_symbol) = price.symbol.filter(|s| !s.trim().is_empty()) else {
        return Err(AnalyzeError::not_found(symbol));
    };

    let detail = result.summary_detail.unwrap_or_default();
    let financial = result.financial_data.unwrap_or_default();
    let stats = result.default_key_statistics.unwrap_or_default();
    let profile = result.asset_profile.unwrap_or_default();

    Ok(TickerRecord {
        symbol: Some(provider_symbol),
        short_name: price.short_name,
        logo_url: profile.logo_url,
        industry: profile.industry,
        sector: profile.sector,
        currency: price.currency,
        current_price: raw(&financial.current_price).or_else(|| raw(&price.regular_market_price)),
        current_ratio: raw(&financial.current_ratio),
        revenue_growth: raw(&financial.revenue_growth),
        profit_margins: raw(&financial.profit_margins).or_else(|| raw(&stats.profit_margins)),
        gross_margins: raw(&financial.gross_margins),
        debt_to_equity: raw(&financial.debt_to_equity),
        beta: raw(&detail.beta).or_else(|| raw(&stats.beta)),
        market_cap: raw(&price.market_cap).or_else(|| raw(&detail.market_cap)),
        trailing_pe: raw(&detail.trailing_pe),
        dividend_yield: raw(&detail.dividend_yield),
        fifty_two_week_high: raw(&detail.fifty_two_week_high),
        fifty_two_week_low: raw(&detail.fifty_two_week_low),
        average_volume: raw(&detail.average_volume),
        history: Vec::new(),
    })
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ChartResult {
    meta: ChartMeta,
    timestamp: Vec<i64>,
    indicators: ChartIndicators,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ChartMeta {
    gmtoffset: i64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ChartIndicators {
    quote: Vec<ChartQuote>,
    adjclose: Vec<ChartAdjClose>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ChartQuote {
    close: Vec<Option<f64>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ChartAdjClose {
    adjclose: Vec<Option<f64>>,
}

/// Daily closes from a chart response, dated in the exchange's local time.
/// Split/dividend adjusted closes are preferred when present.
pub(crate) fn parse_chart(text: &str) -> anyhow::Result<Vec<DailyClose>> {
    let envelope = serde_json::from_str::<ChartEnvelope>(text)
        .with_context(|| format!("chart response is not valid JSON: {text}"))?;

    let Some(result) = envelope.chart.result.and_then(|r| r.into_iter().next()) else {
        return Ok(Vec::new());
    };

    let ChartIndicators { quote, adjclose } = result.indicators;
    let closes = match adjclose.into_iter().next() {
        Some(adj) if !adj.adjclose.is_empty() => adj.adjclose,
        _ => quote.into_iter().next().map(|q| q.close).unwrap_or_default(),
    };

    let offset = result.meta.gmtoffset;
    let out = result
        .timestamp
        .iter()
        .zip(closes)
        .filter_map(|(&ts, close)| {
            let close = close.filter(|c| c.is_finite())?;
            let date = DateTime::from_timestamp(ts + offset, 0)?.date_naive();
            Some(DailyClose { date, close })
        })
        .collect();

    Ok(out)
}
