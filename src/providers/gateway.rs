//! ChainDataGateway
//!
//! The single entry point the scorer uses to gather on-chain facts. Owns a
//! TTL cache keyed by (provider, chain, address, call-kind) and a provider.
//! `enrich` never fails: every sub-fetch is individually caught, a failed
//! lookup leaves its fields unknown and records a degradation marker. Sender,
//! recipient and contract lookups run concurrently.

use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use crate::models::types::{EnrichedFacts, TokenMeta, Transaction, TriState, TxRecord};
use crate::providers::ChainDataProvider;
use crate::utils::cache::{CacheKey, CacheStats, Clock, SystemClock, TtlCache};
use crate::utils::constants::HISTORY_FETCH_LIMIT;

/// Cached fact, one variant per call-kind
#[derive(Debug, Clone)]
enum FactValue {
    Count(u64),
    Age(i64),
    Verified(bool),
    History(Vec<TxRecord>),
    Meta(TokenMeta),
}

#[derive(Default)]
struct WalletFacts {
    tx_count: Option<u64>,
    age_days: Option<i64>,
    history: Vec<TxRecord>,
    failures: Vec<String>,
}

#[derive(Default)]
struct ContractFacts {
    verified: TriState,
    meta: Option<TokenMeta>,
    failures: Vec<String>,
}

/// Failure-tolerant, caching front for a [`ChainDataProvider`]
pub struct ChainDataGateway {
    provider: Arc<dyn ChainDataProvider>,
    cache: TtlCache<FactValue>,
}

impl ChainDataGateway {
    pub fn new(provider: Arc<dyn ChainDataProvider>, ttl: Duration) -> Self {
        Self::with_clock(provider, ttl, Arc::new(SystemClock))
    }

    /// Inject a clock for deterministic TTL tests
    pub fn with_clock(
        provider: Arc<dyn ChainDataProvider>,
        ttl: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            provider,
            cache: TtlCache::with_clock(ttl, clock),
        }
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Gather every fact the models need for one transaction.
    /// Never raises; the worst case is a facts object that is all-unknown
    /// with one degradation marker per failed lookup.
    pub async fn enrich(&self, tx: &Transaction) -> EnrichedFacts {
        let (sender, recipient, contract) = tokio::join!(
            self.wallet_facts(tx, &tx.from_addr, true),
            self.wallet_facts(tx, &tx.to_addr, false),
            self.contract_facts(tx),
        );

        let mut facts = EnrichedFacts {
            wallet_tx_count: sender.tx_count,
            wallet_age_days: sender.age_days,
            recipient_tx_count: recipient.tx_count,
            recipient_age_days: recipient.age_days,
            sender_avg_tx_usd: average_amount(&sender.history),
            sender_history: sender.history,
            contract_verified: contract.verified,
            token_meta: contract.meta,
            failures: Vec::new(),
        };
        facts.failures.extend(sender.failures);
        facts.failures.extend(recipient.failures);
        facts.failures.extend(contract.failures);
        facts
    }

    async fn wallet_facts(&self, tx: &Transaction, address: &str, want_history: bool) -> WalletFacts {
        let mut facts = WalletFacts::default();
        if address.is_empty() {
            return facts; // coerced empty input: no facts, not a failure
        }
        let side = if want_history { "sender" } else { "recipient" };

        match self.cached_tx_count(tx, address).await {
            Ok(count) => facts.tx_count = Some(count),
            Err(err) => {
                warn!("{} tx-count lookup failed: {}", side, err);
                facts.failures.push(format!("degraded:{}_tx_count", side));
            }
        }

        match self.cached_age_days(tx, address).await {
            Ok(age) => facts.age_days = Some(age),
            Err(err) => {
                warn!("{} age lookup failed: {}", side, err);
                facts.failures.push(format!("degraded:{}_age", side));
            }
        }

        if want_history {
            match self.cached_history(tx, address).await {
                Ok(history) => facts.history = history,
                Err(err) => {
                    warn!("{} history lookup failed: {}", side, err);
                    facts.failures.push(format!("degraded:{}_history", side));
                }
            }
        }
        facts
    }

    async fn contract_facts(&self, tx: &Transaction) -> ContractFacts {
        let mut facts = ContractFacts::default();
        let contract = match tx.token_contract.as_deref() {
            Some(c) => c,
            None => return facts,
        };

        match self.cached_verified(tx, contract).await {
            Ok(verified) => facts.verified = TriState::from_bool(verified),
            Err(err) => {
                warn!("contract verification lookup failed: {}", err);
                facts.failures.push("degraded:contract_verified".into());
            }
        }

        match self.cached_token_meta(tx, contract).await {
            Ok(meta) => facts.meta = Some(meta),
            Err(err) => {
                warn!("token metadata lookup failed: {}", err);
                facts.failures.push("degraded:token_meta".into());
            }
        }
        facts
    }

    fn key(&self, tx: &Transaction, address: &str, call: &'static str) -> CacheKey {
        CacheKey::new(self.provider.name(), tx.chain.api_slug(), address, call)
    }

    async fn cached_tx_count(&self, tx: &Transaction, address: &str) -> crate::models::errors::AppResult<u64> {
        let key = self.key(tx, address, "tx_count");
        if let Some(FactValue::Count(v)) = self.cache.get(&key) {
            return Ok(v);
        }
        let v = self.provider.get_wallet_tx_count(tx.chain, address).await?;
        self.cache.set(key, FactValue::Count(v));
        Ok(v)
    }

    async fn cached_age_days(&self, tx: &Transaction, address: &str) -> crate::models::errors::AppResult<i64> {
        let key = self.key(tx, address, "age_days");
        if let Some(FactValue::Age(v)) = self.cache.get(&key) {
            return Ok(v);
        }
        let v = self.provider.get_wallet_age_days(tx.chain, address).await?;
        self.cache.set(key, FactValue::Age(v));
        Ok(v)
    }

    async fn cached_history(&self, tx: &Transaction, address: &str) -> crate::models::errors::AppResult<Vec<TxRecord>> {
        let key = self.key(tx, address, "history");
        if let Some(FactValue::History(v)) = self.cache.get(&key) {
            return Ok(v);
        }
        let v = self
            .provider
            .get_address_transactions(tx.chain, address, HISTORY_FETCH_LIMIT)
            .await?;
        self.cache.set(key, FactValue::History(v.clone()));
        Ok(v)
    }

    async fn cached_verified(&self, tx: &Transaction, contract: &str) -> crate::models::errors::AppResult<bool> {
        let key = self.key(tx, contract, "verified");
        if let Some(FactValue::Verified(v)) = self.cache.get(&key) {
            return Ok(v);
        }
        let v = self.provider.is_contract_verified(tx.chain, contract).await?;
        self.cache.set(key, FactValue::Verified(v));
        Ok(v)
    }

    async fn cached_token_meta(&self, tx: &Transaction, contract: &str) -> crate::models::errors::AppResult<TokenMeta> {
        let key = self.key(tx, contract, "token_meta");
        if let Some(FactValue::Meta(v)) = self.cache.get(&key) {
            return Ok(v);
        }
        let v = self.provider.get_token_metadata(tx.chain, contract).await?;
        self.cache.set(key, FactValue::Meta(v.clone()));
        Ok(v)
    }
}

fn average_amount(history: &[TxRecord]) -> Option<f64> {
    if history.is_empty() {
        return None;
    }
    Some(history.iter().map(|r| r.amount_usd).sum::<f64>() / history.len() as f64)
}
