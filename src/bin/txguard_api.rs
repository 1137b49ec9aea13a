//! txguard API server
//!
//! Exposes the scoring engine over HTTP:
//! - POST /api/v1/score — score a proposed transfer
//! - GET  /api/v1/stats — gateway cache statistics
//! - GET  /health

use eyre::Result;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use txguard::api::{create_router, AppState};
use txguard::providers::ChainDataProvider;
use txguard::{EtherscanProvider, MemoryProvider, RiskScorer, ScoringConfig};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_target(false)
        .compact()
        .init();

    let config = ScoringConfig::from_env();

    let provider: Arc<dyn ChainDataProvider> = match std::env::var("ETHERSCAN_API_KEY") {
        Ok(key) if !key.is_empty() => {
            info!("🔑 Etherscan-family provider configured (key hidden)");
            Arc::new(EtherscanProvider::new(key, config.request_timeout)?)
        }
        _ => {
            info!("ETHERSCAN_API_KEY not set, serving from offline fixtures");
            Arc::new(MemoryProvider::new())
        }
    };

    let scorer = RiskScorer::new(config, provider)?;
    let state = Arc::new(AppState { scorer });
    let router = create_router(state);

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);
    let addr = format!("0.0.0.0:{}", port);

    info!("🚀 txguard API listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
