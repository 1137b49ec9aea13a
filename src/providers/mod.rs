//! Chain-data providers and the caching gateway in front of them

pub mod etherscan;
pub mod gateway;
pub mod memory;

use async_trait::async_trait;

use crate::models::errors::AppResult;
use crate::models::types::{Chain, TokenMeta, TxRecord};

/// Narrow read-only interface to a blockchain data source.
///
/// Implementations map transport failures to typed errors; they never panic.
/// Interpretation of the facts (neutral vs. signal) is the models' job, not
/// the provider's.
#[async_trait]
pub trait ChainDataProvider: Send + Sync {
    /// Stable name, used in cache keys and degradation markers
    fn name(&self) -> &'static str;

    /// Total transaction count of a wallet
    async fn get_wallet_tx_count(&self, chain: Chain, address: &str) -> AppResult<u64>;

    /// Approximate wallet age from its first transaction. A wallet with no
    /// history reports 0 days.
    async fn get_wallet_age_days(&self, chain: Chain, address: &str) -> AppResult<i64>;

    /// Whether the contract source code is verified
    async fn is_contract_verified(&self, chain: Chain, address: &str) -> AppResult<bool>;

    /// Recent transfers of an address, newest first, bounded by `limit`
    async fn get_address_transactions(
        &self,
        chain: Chain,
        address: &str,
        limit: u32,
    ) -> AppResult<Vec<TxRecord>>;

    /// Token contract metadata (taxes, ownership), where the source offers it
    async fn get_token_metadata(&self, chain: Chain, contract: &str) -> AppResult<TokenMeta>;
}

pub use etherscan::EtherscanProvider;
pub use gateway::ChainDataGateway;
pub use memory::MemoryProvider;
