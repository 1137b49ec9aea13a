//! txguard - Pre-transaction risk scoring engine
//!
//! CLI runner: scores one proposed transfer and prints the verdict.
//! Pass a JSON file with the transaction fields, or run without arguments
//! for a demo pass against the built-in offline fixtures.

use chrono::Utc;
use eyre::Result;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use txguard::api::types::ScoreRequest;
use txguard::models::types::{Chain, Transaction};
use txguard::providers::memory::{ContractFixture, WalletFixture};
use txguard::providers::ChainDataProvider;
use txguard::{EtherscanProvider, MemoryProvider, RiskScorer, ScoringConfig};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_target(false)
        .compact()
        .init();

    println!("txguard — pre-transaction risk scoring engine v{}", env!("CARGO_PKG_VERSION"));

    let config = ScoringConfig::from_env();

    // Live provider when a key is configured, offline fixtures otherwise
    let provider: Arc<dyn ChainDataProvider> = match std::env::var("ETHERSCAN_API_KEY") {
        Ok(key) if !key.is_empty() => {
            info!("Using Etherscan-family provider");
            Arc::new(EtherscanProvider::new(key, config.request_timeout)?)
        }
        _ => {
            info!("ETHERSCAN_API_KEY not set, using offline fixtures");
            Arc::new(demo_provider())
        }
    };

    let scorer = RiskScorer::new(config, provider)?;

    let tx = match std::env::args().nth(1) {
        Some(path) => {
            let raw = std::fs::read_to_string(&path)?;
            let request: ScoreRequest = serde_json::from_str(&raw)?;
            let chain = Chain::parse(&request.chain)
                .ok_or_else(|| eyre::eyre!("unsupported chain '{}'", request.chain))?;
            Transaction::new(
                chain,
                &request.from_addr,
                &request.to_addr,
                &request.token_symbol,
                request.token_contract.as_deref(),
                request.amount,
                request.amount_usd,
                request.timestamp.unwrap_or_else(Utc::now),
            )
        }
        None => demo_transaction(),
    };

    let verdict = scorer.score_pre_transaction(&tx).await;
    println!("{}", verdict.summary());
    println!("{}", serde_json::to_string_pretty(&verdict)?);

    Ok(())
}

/// Offline fixtures mirroring a settled sender and a fresh recipient
fn demo_provider() -> MemoryProvider {
    let history = (1..=8)
        .map(|i| txguard::models::types::TxRecord {
            timestamp: Utc::now() - chrono::Duration::days(i),
            amount_usd: 250.0 + i as f64 * 40.0,
        })
        .collect();
    MemoryProvider::new()
        .with_wallet(
            "0x47ac0fb4f2d84898e4d9e7b4dab3c24507a6d503",
            WalletFixture {
                tx_count: 340,
                age_days: 1_200,
                history,
            },
        )
        .with_contract(
            "0xdac17f958d2ee523a2206206994597c13d831ec7",
            ContractFixture {
                verified: true,
                ..Default::default()
            },
        )
}

fn demo_transaction() -> Transaction {
    Transaction::new(
        Chain::Ethereum,
        "0x47ac0fb4f2d84898e4d9e7b4dab3c24507a6d503",
        "0x8576acc5c05d6ce88f4e49bf65bdf0c62f91353c",
        "USDT",
        Some("0xdac17f958d2ee523a2206206994597c13d831ec7"),
        4_800.0,
        4_800.0,
        Utc::now(),
    )
}
