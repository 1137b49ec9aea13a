//! API Request/Response Types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::types::Verdict;

/// API Response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
    pub request_id: String,
    pub latency_ms: f64,
    pub timestamp: i64,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T, request_id: String, latency_ms: f64) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            request_id,
            latency_ms,
            timestamp: Utc::now().timestamp(),
        }
    }
}

impl ApiResponse<()> {
    pub fn error(error: ApiError, request_id: String, latency_ms: f64) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error),
            request_id,
            latency_ms,
            timestamp: Utc::now().timestamp(),
        }
    }
}

/// API Error payload
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            code: "API_BAD_REQUEST".to_string(),
            message: message.into(),
        }
    }
}

// ============================================
// Scoring
// ============================================

/// Scoring request. Every field except the chain is defaulted so a partial
/// request coerces into a scoreable transaction instead of failing — a
/// partial verdict is more useful than none.
#[derive(Debug, Deserialize)]
pub struct ScoreRequest {
    #[serde(default = "default_chain")]
    pub chain: String,
    #[serde(default)]
    pub from_addr: String,
    #[serde(default)]
    pub to_addr: String,
    #[serde(default)]
    pub token_symbol: String,
    #[serde(default)]
    pub token_contract: Option<String>,
    #[serde(default)]
    pub amount: f64,
    #[serde(default)]
    pub amount_usd: f64,
    /// Defaults to "now" when absent
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

fn default_chain() -> String {
    "ethereum".to_string()
}

#[derive(Debug, Serialize)]
pub struct ScoreData {
    pub chain: String,
    pub verdict: Verdict,
}

#[derive(Debug, Serialize)]
pub struct HealthData {
    pub status: &'static str,
    pub version: &'static str,
}
