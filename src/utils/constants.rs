//! Static reference tables
//!
//! Deny lists, token tables and cluster seeds used by the scoring models.
//! In production these would be refreshed from a threat-intel feed; the
//! built-in sets are the curated defaults the engine ships with. No model
//! hardcodes its own copies — everything table-shaped lives here.

use lazy_static::lazy_static;
use std::collections::{HashMap, HashSet};

// ============================================
// Network defaults
// ============================================

/// Default TTL for gateway cache entries
pub const DEFAULT_CACHE_TTL_SECS: u64 = 60;

/// Mandatory per-call timeout for provider requests
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Bounded retry for rate-limited provider calls
pub const MAX_PROVIDER_RETRIES: u32 = 3;
pub const BASE_RETRY_MS: u64 = 500;
pub const MAX_RETRY_MS: u64 = 4_000;
pub const RETRY_JITTER_PERCENT: u64 = 20;

/// Sent with every provider request
pub const USER_AGENT: &str = "txguard/0.1";

/// How many historical transfers to request per sender
pub const HISTORY_FETCH_LIMIT: u32 = 50;

lazy_static! {
    // ============================================
    // Deny lists
    // ============================================

    /// Known-bad wallet addresses (exact match on canonical form)
    pub static ref ADDRESS_BLACKLIST: HashSet<&'static str> = {
        let mut set = HashSet::new();
        set.insert("0x098b716b8aaf21512996dc57eb0615e2383e2f96");
        set.insert("0x7f367cc41522ce07553e823bf3be79a889debe1b");
        set.insert("0x1da5821544e25c636c1417ba96ade4cf6d2f9b5a");
        set.insert("0x72a5843cc08275c8171e582972aa4fda8c397b2a");
        set
    };

    /// Known-bad token contracts
    pub static ref CONTRACT_BLACKLIST: HashSet<&'static str> = {
        let mut set = HashSet::new();
        set.insert("0x3f17f1962b36e491b30a40b2405849e597ba5fb5");
        set.insert("0xe530441f4f73bdb6dc2fa5af7c3fc5fd551ec838");
        set
    };

    // ============================================
    // Token tables
    // ============================================

    /// High-volatility / meme tokens that raise the rules signal
    pub static ref RISKY_TOKENS: HashSet<&'static str> = {
        let mut set = HashSet::new();
        set.insert("SHIB");
        set.insert("PEPE");
        set.insert("FLOKI");
        set.insert("ELON");
        set.insert("SQUID");
        set.insert("LUNA2");
        set
    };

    /// Major token symbols commonly impersonated by scam contracts,
    /// mapped to their genuine mainnet contract (None for native assets)
    pub static ref MAJOR_TOKENS: HashMap<&'static str, Option<&'static str>> = {
        let mut map = HashMap::new();
        map.insert("ETH", None);
        map.insert("BTC", None);
        map.insert("BNB", None);
        map.insert("USDT", Some("0xdac17f958d2ee523a2206206994597c13d831ec7"));
        map.insert("USDC", Some("0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48"));
        map.insert("DAI", Some("0x6b175474e89094c44da98b954eedeac495271d0f"));
        map
    };

    /// Per-symbol volatility estimate feeding the tabular feature vector
    pub static ref TOKEN_VOLATILITY: HashMap<&'static str, f64> = {
        let mut map = HashMap::new();
        map.insert("ETH", 0.20);
        map.insert("USDT", 0.05);
        map.insert("USDC", 0.05);
        map.insert("DAI", 0.05);
        map.insert("BNB", 0.18);
        map.insert("BTC", 0.15);
        map.insert("DOGE", 0.45);
        map.insert("SHIB", 0.55);
        map.insert("PEPE", 0.60);
        map
    };

    // ============================================
    // Reason impact weights
    // ============================================

    /// Fixed impact per reason category, used to rank `top_features`.
    /// Deliberately independent of the rule point table.
    pub static ref REASON_IMPACT: HashMap<&'static str, f64> = {
        let mut map = HashMap::new();
        map.insert("blacklisted_address", 1.00);
        map.insert("contract_blacklisted", 0.95);
        map.insert("high_amount", 0.60);
        map.insert("honeypot_sell_tax", 0.55);
        map.insert("contract_unverified", 0.50);
        map.insert("symbol_impersonation", 0.50);
        map.insert("fresh_recipient", 0.45);
        map.insert("risky_token", 0.40);
        map.insert("large_deviation", 0.40);
        map.insert("high_buy_tax", 0.35);
        map.insert("owner_not_renounced", 0.30);
        map.insert("rapid_burst", 0.30);
        map.insert("dusting", 0.25);
        map.insert("self_transfer", 0.20);
        map.insert("odd_hour", 0.10);
        map
    };
}

/// Volatility for a symbol, defaulting to the mid estimate for unknown tokens
pub fn token_volatility(symbol: &str) -> f64 {
    TOKEN_VOLATILITY.get(symbol).copied().unwrap_or(0.30)
}

/// Impact weight for a reason id (unlisted reasons rank low, not zero)
pub fn reason_impact(reason_id: &str) -> f64 {
    REASON_IMPACT.get(reason_id).copied().unwrap_or(0.15)
}
