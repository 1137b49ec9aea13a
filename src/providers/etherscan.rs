//! Etherscan-family REST provider
//!
//! One provider covers the three supported chains through their scan APIs
//! (etherscan.io, bscscan.com, polygonscan.com). Discipline for every call:
//! - fixed per-request timeout baked into the client (10s default)
//! - bounded retry with exponential backoff + jitter on rate limiting
//! - loose JSON parsing: a missing field is an invalid-response error for the
//!   caller to degrade on, never a panic

use chrono::{TimeZone, Utc};
use rand::Rng;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT as USER_AGENT_HEADER};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

use async_trait::async_trait;

use crate::models::errors::{AppError, AppResult};
use crate::models::types::{Chain, TokenMeta, TriState, TxRecord};
use crate::providers::ChainDataProvider;
use crate::utils::constants::{
    BASE_RETRY_MS, MAX_PROVIDER_RETRIES, MAX_RETRY_MS, RETRY_JITTER_PERCENT, USER_AGENT,
};

const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

/// Etherscan-style chain-data provider
pub struct EtherscanProvider {
    client: reqwest::Client,
    api_key: String,
    /// Rough native-asset price used to express transfer values in USD.
    /// Good enough for deviation/burst heuristics; not a price oracle.
    native_usd: f64,
}

impl EtherscanProvider {
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> AppResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT_HEADER, HeaderValue::from_static(USER_AGENT));

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .gzip(true)
            .default_headers(headers)
            .build()
            .map_err(AppError::from)?;

        let native_usd = std::env::var("TXGUARD_NATIVE_USD")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(2500.0);

        Ok(Self {
            client,
            api_key: api_key.into(),
            native_usd,
        })
    }

    fn base_url(chain: Chain) -> &'static str {
        match chain {
            Chain::Ethereum => "https://api.etherscan.io/api",
            Chain::Bsc => "https://api.bscscan.com/api",
            Chain::Polygon => "https://api.polygonscan.com/api",
        }
    }

    /// GET with bounded retry. Only retryable failures (429, timeout,
    /// connection) are re-attempted; everything else surfaces immediately.
    async fn get_json(&self, chain: Chain, params: &[(&str, &str)]) -> AppResult<Value> {
        let url = Self::base_url(chain);
        let mut attempt = 0u32;
        loop {
            let result = self.try_get_json(url, params).await;
            match result {
                Ok(value) => return Ok(value),
                Err(err) if err.code.is_retryable() && attempt < MAX_PROVIDER_RETRIES => {
                    let delay = Self::backoff_delay(attempt);
                    debug!(
                        "Provider retry {}/{} after {:?} ({})",
                        attempt + 1,
                        MAX_PROVIDER_RETRIES,
                        delay,
                        err.code_str()
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn try_get_json(&self, url: &str, params: &[(&str, &str)]) -> AppResult<Value> {
        let mut query: Vec<(&str, &str)> = params.to_vec();
        query.push(("apikey", self.api_key.as_str()));

        let response = self.client.get(url).query(&query).send().await?;
        if response.status().as_u16() == 429 {
            return Err(AppError::gateway_rate_limited());
        }
        if !response.status().is_success() {
            return Err(AppError::gateway_error(format!(
                "HTTP {} from provider",
                response.status()
            )));
        }
        let body: Value = response.json().await?;
        Ok(body)
    }

    /// Exponential backoff with jitter: 500ms → 1s → 2s (capped), ±20%
    fn backoff_delay(attempt: u32) -> Duration {
        let base = (BASE_RETRY_MS << attempt).min(MAX_RETRY_MS);
        let jitter_span = base * RETRY_JITTER_PERCENT / 100;
        let jitter = rand::thread_rng().gen_range(0..=jitter_span.max(1));
        Duration::from_millis(base + jitter)
    }

    fn wei_str_to_usd(&self, wei: &str) -> f64 {
        let wei: f64 = wei.parse().unwrap_or(0.0);
        (wei / 1e18) * self.native_usd
    }
}

#[async_trait]
impl ChainDataProvider for EtherscanProvider {
    fn name(&self) -> &'static str {
        "etherscan"
    }

    async fn get_wallet_tx_count(&self, chain: Chain, address: &str) -> AppResult<u64> {
        let body = self
            .get_json(
                chain,
                &[
                    ("module", "proxy"),
                    ("action", "eth_getTransactionCount"),
                    ("address", address),
                    ("tag", "latest"),
                ],
            )
            .await?;

        let hex_count = body
            .get("result")
            .and_then(Value::as_str)
            .ok_or_else(|| AppError::gateway_invalid_response("missing result field"))?;
        u64::from_str_radix(hex_count.trim_start_matches("0x"), 16)
            .map_err(|_| AppError::gateway_invalid_response("non-hex transaction count"))
    }

    async fn get_wallet_age_days(&self, chain: Chain, address: &str) -> AppResult<i64> {
        let body = self
            .get_json(
                chain,
                &[
                    ("module", "account"),
                    ("action", "txlist"),
                    ("address", address),
                    ("page", "1"),
                    ("offset", "1"),
                    ("sort", "asc"),
                ],
            )
            .await?;

        let txs = body
            .get("result")
            .and_then(Value::as_array)
            .ok_or_else(|| AppError::gateway_invalid_response("missing txlist result"))?;

        let first = match txs.first() {
            Some(tx) => tx,
            None => return Ok(0), // no history at all
        };
        let first_ts: i64 = first
            .get("timeStamp")
            .and_then(Value::as_str)
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| AppError::gateway_invalid_response("missing timeStamp"))?;

        Ok(((Utc::now().timestamp() - first_ts) / 86_400).max(0))
    }

    async fn is_contract_verified(&self, chain: Chain, address: &str) -> AppResult<bool> {
        let body = self
            .get_json(
                chain,
                &[
                    ("module", "contract"),
                    ("action", "getsourcecode"),
                    ("address", address),
                ],
            )
            .await?;

        let source = body
            .get("result")
            .and_then(Value::as_array)
            .and_then(|arr| arr.first())
            .and_then(|entry| entry.get("SourceCode"))
            .and_then(Value::as_str)
            .unwrap_or("");
        Ok(!source.is_empty())
    }

    async fn get_address_transactions(
        &self,
        chain: Chain,
        address: &str,
        limit: u32,
    ) -> AppResult<Vec<TxRecord>> {
        let limit_str = limit.to_string();
        let body = self
            .get_json(
                chain,
                &[
                    ("module", "account"),
                    ("action", "txlist"),
                    ("address", address),
                    ("page", "1"),
                    ("offset", limit_str.as_str()),
                    ("sort", "desc"),
                ],
            )
            .await?;

        let txs = body
            .get("result")
            .and_then(Value::as_array)
            .ok_or_else(|| AppError::gateway_invalid_response("missing txlist result"))?;

        let mut records = Vec::with_capacity(txs.len());
        for tx in txs {
            let ts: i64 = match tx
                .get("timeStamp")
                .and_then(Value::as_str)
                .and_then(|s| s.parse().ok())
            {
                Some(ts) => ts,
                None => continue, // skip malformed rows rather than failing the batch
            };
            let timestamp = match Utc.timestamp_opt(ts, 0).single() {
                Some(t) => t,
                None => continue,
            };
            let amount_usd = tx
                .get("value")
                .and_then(Value::as_str)
                .map(|wei| self.wei_str_to_usd(wei))
                .unwrap_or(0.0);
            records.push(TxRecord {
                timestamp,
                amount_usd,
            });
        }
        Ok(records)
    }

    async fn get_token_metadata(&self, chain: Chain, contract: &str) -> AppResult<TokenMeta> {
        let body = self
            .get_json(
                chain,
                &[
                    ("module", "token"),
                    ("action", "tokeninfo"),
                    ("contractaddress", contract),
                ],
            )
            .await?;

        let info = body
            .get("result")
            .and_then(Value::as_array)
            .and_then(|arr| arr.first())
            .cloned()
            .unwrap_or(Value::Null);

        if info.is_null() {
            warn!("No token metadata for {}", contract);
            return Ok(TokenMeta::default());
        }

        let parse_pct = |key: &str| -> Option<f64> {
            info.get(key)
                .and_then(|v| match v {
                    Value::String(s) => s.trim_end_matches('%').parse().ok(),
                    Value::Number(n) => n.as_f64(),
                    _ => None,
                })
        };

        let owner_renounced = match info.get("owner").and_then(Value::as_str) {
            Some(owner) if owner.eq_ignore_ascii_case(ZERO_ADDRESS) => TriState::Yes,
            Some(owner) if !owner.is_empty() => TriState::No,
            _ => TriState::Unknown,
        };

        Ok(TokenMeta {
            buy_tax: parse_pct("buyTax"),
            sell_tax: parse_pct("sellTax"),
            owner_renounced,
        })
    }
}
