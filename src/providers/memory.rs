//! In-memory fixture provider
//!
//! Deterministic, offline chain-data source. Used by the CLI demo when no API
//! key is configured, and by tests that need a frozen snapshot (same inputs →
//! same verdict) or a total provider outage.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::models::errors::{AppError, AppResult};
use crate::models::types::{Chain, TokenMeta, TxRecord};
use crate::providers::ChainDataProvider;
use crate::utils::address::normalize_address;

/// Fixture data for one wallet
#[derive(Debug, Clone, Default)]
pub struct WalletFixture {
    pub tx_count: u64,
    pub age_days: i64,
    pub history: Vec<TxRecord>,
}

/// Fixture data for one token contract
#[derive(Debug, Clone, Default)]
pub struct ContractFixture {
    pub verified: bool,
    pub meta: TokenMeta,
}

/// Offline provider over fixed fixtures. Wallets without a fixture report an
/// empty chain presence (zero transactions, zero age) — the same shape a live
/// provider returns for a brand-new address.
#[derive(Default)]
pub struct MemoryProvider {
    wallets: HashMap<String, WalletFixture>,
    contracts: HashMap<String, ContractFixture>,
    fail_all: bool,
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// A provider where every call fails, to exercise degraded scoring
    pub fn failing() -> Self {
        Self {
            fail_all: true,
            ..Self::default()
        }
    }

    pub fn with_wallet(mut self, address: &str, fixture: WalletFixture) -> Self {
        self.wallets.insert(normalize_address(address), fixture);
        self
    }

    pub fn with_contract(mut self, address: &str, fixture: ContractFixture) -> Self {
        self.contracts.insert(normalize_address(address), fixture);
        self
    }

    fn check_outage(&self) -> AppResult<()> {
        if self.fail_all {
            Err(AppError::gateway_error("simulated provider outage"))
        } else {
            Ok(())
        }
    }

    fn wallet(&self, address: &str) -> WalletFixture {
        self.wallets
            .get(&normalize_address(address))
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl ChainDataProvider for MemoryProvider {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn get_wallet_tx_count(&self, _chain: Chain, address: &str) -> AppResult<u64> {
        self.check_outage()?;
        Ok(self.wallet(address).tx_count)
    }

    async fn get_wallet_age_days(&self, _chain: Chain, address: &str) -> AppResult<i64> {
        self.check_outage()?;
        Ok(self.wallet(address).age_days)
    }

    async fn is_contract_verified(&self, _chain: Chain, address: &str) -> AppResult<bool> {
        self.check_outage()?;
        Ok(self
            .contracts
            .get(&normalize_address(address))
            .map(|c| c.verified)
            .unwrap_or(false))
    }

    async fn get_address_transactions(
        &self,
        _chain: Chain,
        address: &str,
        limit: u32,
    ) -> AppResult<Vec<TxRecord>> {
        self.check_outage()?;
        let mut history = self.wallet(address).history;
        history.truncate(limit as usize);
        Ok(history)
    }

    async fn get_token_metadata(&self, _chain: Chain, contract: &str) -> AppResult<TokenMeta> {
        self.check_outage()?;
        Ok(self
            .contracts
            .get(&normalize_address(contract))
            .map(|c| c.meta.clone())
            .unwrap_or_default())
    }
}
