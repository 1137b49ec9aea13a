//! API Request Handlers

use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;
use uuid::Uuid;

use crate::api::types::{ApiError, ApiResponse, HealthData, ScoreData, ScoreRequest};
use crate::models::types::{Chain, Transaction};
use crate::scorer::RiskScorer;
use crate::utils::cache::CacheStats;

/// Shared application state
pub struct AppState {
    pub scorer: RiskScorer,
}

/// GET /health
pub async fn health_check() -> Json<ApiResponse<HealthData>> {
    Json(ApiResponse::success(
        HealthData {
            status: "ok",
            version: env!("CARGO_PKG_VERSION"),
        },
        Uuid::new_v4().to_string(),
        0.0,
    ))
}

/// GET /api/v1/stats — gateway cache statistics
pub async fn get_stats(State(state): State<Arc<AppState>>) -> Json<ApiResponse<CacheStats>> {
    Json(ApiResponse::success(
        state.scorer.cache_stats(),
        Uuid::new_v4().to_string(),
        0.0,
    ))
}

/// POST /api/v1/score — the scoring endpoint
pub async fn score_transaction(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ScoreRequest>,
) -> Result<Json<ApiResponse<ScoreData>>, (StatusCode, Json<ApiResponse<()>>)> {
    let started = Instant::now();
    let request_id = Uuid::new_v4().to_string();

    // The one request error we refuse outright: a chain we cannot route
    let chain = match Chain::parse(&request.chain) {
        Some(chain) => chain,
        None => {
            let latency = started.elapsed().as_secs_f64() * 1000.0;
            return Err((
                StatusCode::BAD_REQUEST,
                Json(ApiResponse::error(
                    ApiError::bad_request(format!("unsupported chain '{}'", request.chain)),
                    request_id,
                    latency,
                )),
            ));
        }
    };

    let tx = Transaction::new(
        chain,
        &request.from_addr,
        &request.to_addr,
        &request.token_symbol,
        request.token_contract.as_deref(),
        request.amount,
        request.amount_usd,
        request.timestamp.unwrap_or_else(Utc::now),
    );

    let verdict = state.scorer.score_pre_transaction(&tx).await;
    let latency = started.elapsed().as_secs_f64() * 1000.0;
    info!(
        "[{}] scored {} {} -> {:.2} ({})",
        request_id,
        tx.token_symbol,
        tx.to_addr,
        verdict.risk_score,
        verdict.action.as_str()
    );

    Ok(Json(ApiResponse::success(
        ScoreData {
            chain: chain.api_slug().to_string(),
            verdict,
        },
        request_id,
        latency,
    )))
}
