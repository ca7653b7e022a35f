use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use stockdex_core::analysis::analyzer::RiskReport;
use stockdex_core::analysis::risk::DEFAULT_CONFIDENCE_LEVEL;
use stockdex_core::domain::snapshot::AssetSnapshot;
use stockdex_core::domain::team::TeamSnapshot;
use stockdex_core::ingest::search::{SearchHit, TickerSearch};
use stockdex_core::Analyzer;

pub mod error;

use error::ApiResult;

#[derive(Clone)]
pub struct AppState {
    pub analyzer: Arc<Analyzer>,
    pub search: Arc<dyn TickerSearch>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/analyze/:ticker", get(analyze))
        .route("/search", get(search))
        .route("/analyze-team", post(analyze_team))
        .route("/api/v1/risk-metrics/:ticker", get(risk_metrics))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

async fn healthz() -> &'static str {
    "ok"
}

async fn analyze(
    State(state): State<AppState>,
    Path(ticker): Path<String>,
) -> ApiResult<Json<Arc<AssetSnapshot>>> {
    Ok(Json(state.analyzer.analyze(&ticker).await?))
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    #[serde(default)]
    q: String,
}

async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Json<Vec<SearchHit>> {
    let query = params.q.trim();
    if query.is_empty() {
        return Json(Vec::new());
    }

    match state.search.search(query).await {
        Ok(hits) => Json(hits),
        Err(e) => {
            tracing::warn!(%query, error = %e, "ticker search failed");
            Json(Vec::new())
        }
    }
}

#[derive(Debug, Deserialize)]
struct TeamRequest {
    tickers: Vec<String>,
}

async fn analyze_team(
    State(state): State<AppState>,
    Json(req): Json<TeamRequest>,
) -> ApiResult<Json<TeamSnapshot>> {
    Ok(Json(state.analyzer.analyze_team(req.tickers.as_slice()).await?))
}

#[derive(Debug, Deserialize)]
struct RiskParams {
    confidence: Option<f64>,
}

async fn risk_metrics(
    State(state): State<AppState>,
    Path(ticker): Path<String>,
    Query(params): Query<RiskParams>,
) -> ApiResult<Json<RiskReport>> {
    let confidence = params.confidence.unwrap_or(DEFAULT_CONFIDENCE_LEVEL);
    Ok(Json(state.analyzer.risk_report(&ticker, confidence).await?))
}
