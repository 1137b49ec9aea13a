//! Scoring configuration
//!
//! Every tunable of the engine lives here: the rule point table, the
//! component weight vector, label/action thresholds, cache TTL and network
//! timeouts. Sub-models receive these values; none of them hardcodes its own.
//! Historical deployments disagreed on the exact numbers, so they are
//! configuration with validated defaults, not business logic.

use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

use crate::models::errors::{AppError, AppResult};
use crate::models::types::{Action, RiskLabel};
use crate::utils::constants::{DEFAULT_CACHE_TTL_SECS, DEFAULT_REQUEST_TIMEOUT_SECS};

/// Points contributed by each rule when it fires.
/// The rule score is normalized by the sum of all entries, so triggering
/// every rule saturates at 1.0 and partial triggers scale proportionally.
#[derive(Debug, Clone)]
pub struct RulePoints {
    pub blacklist: u32,
    pub high_amount: u32,
    pub fresh_wallet: u32,
    pub risky_token: u32,
    pub contract_unverified: u32,
    pub rapid_burst: u32,
    pub large_deviation: u32,
    pub dusting: u32,
    pub self_transfer: u32,
    pub odd_hour: u32,
}

impl Default for RulePoints {
    fn default() -> Self {
        Self {
            blacklist: 30,
            high_amount: 25,
            fresh_wallet: 20,
            risky_token: 20,
            contract_unverified: 25,
            rapid_burst: 15,
            large_deviation: 20,
            dusting: 10,
            self_transfer: 10,
            odd_hour: 5,
        }
    }
}

impl RulePoints {
    /// Normalization denominator for the rule score
    pub fn max_possible(&self) -> u32 {
        self.blacklist
            + self.high_amount
            + self.fresh_wallet
            + self.risky_token
            + self.contract_unverified
            + self.rapid_burst
            + self.large_deviation
            + self.dusting
            + self.self_transfer
            + self.odd_hour
    }
}

/// Trigger thresholds for the individual rules
#[derive(Debug, Clone)]
pub struct RuleThresholds {
    /// Amount tiers in USD, descending; each grants decreasing partial credit
    pub amount_tier_high: f64,
    pub amount_tier_mid: f64,
    pub amount_tier_low: f64,
    /// Partial credit for the mid/low tiers (the high tier grants full points)
    pub amount_points_mid: u32,
    pub amount_points_low: u32,
    /// Recipient younger than this is "fresh"
    pub fresh_wallet_days: i64,
    /// Daytime window in UTC hours: [end, start) is normal, outside is odd
    pub odd_hour_start: u32,
    pub odd_hour_end: u32,
    /// Trailing-hour transaction count that counts as a burst
    pub rapid_burst_count: usize,
    /// Transfers below this are dust
    pub dust_amount_usd: f64,
    /// Sender activity bar for the dusting pattern
    pub dust_activity_count: u64,
    /// Multiple of the sender's historical average that fires the deviation rule
    pub deviation_ratio: f64,
}

impl Default for RuleThresholds {
    fn default() -> Self {
        Self {
            amount_tier_high: 100_000.0,
            amount_tier_mid: 10_000.0,
            amount_tier_low: 1_000.0,
            amount_points_mid: 15,
            amount_points_low: 8,
            fresh_wallet_days: 30,
            odd_hour_start: 22,
            odd_hour_end: 3,
            rapid_burst_count: 10,
            dust_amount_usd: 1.0,
            dust_activity_count: 20,
            deviation_ratio: 10.0,
        }
    }
}

/// Weight of each component in the final ensemble; must sum to 1.0
#[derive(Debug, Clone)]
pub struct ComponentWeights {
    pub rules: f64,
    pub tabular: f64,
    pub sequence: f64,
    pub graph: f64,
    pub contract: f64,
}

impl Default for ComponentWeights {
    fn default() -> Self {
        Self {
            rules: 0.30,
            tabular: 0.25,
            sequence: 0.15,
            graph: 0.12,
            contract: 0.18,
        }
    }
}

impl ComponentWeights {
    pub fn sum(&self) -> f64 {
        self.rules + self.tabular + self.sequence + self.graph + self.contract
    }
}

/// Score boundaries mapping to labels/actions
#[derive(Debug, Clone)]
pub struct ScoreThresholds {
    pub block: f64,
    pub warn: f64,
}

impl Default for ScoreThresholds {
    fn default() -> Self {
        Self {
            block: 85.0,
            warn: 60.0,
        }
    }
}

impl ScoreThresholds {
    /// The single place label and action are derived, so they cannot disagree
    pub fn classify(&self, score: f64) -> (RiskLabel, Action) {
        if score >= self.block {
            (RiskLabel::HighRisk, Action::Block)
        } else if score >= self.warn {
            (RiskLabel::Suspicious, Action::Warn)
        } else {
            (RiskLabel::Safe, Action::Allow)
        }
    }
}

/// Tax thresholds for the contract risk model (percent)
#[derive(Debug, Clone)]
pub struct ContractThresholds {
    pub sell_tax_pct: f64,
    pub buy_tax_pct: f64,
}

impl Default for ContractThresholds {
    fn default() -> Self {
        Self {
            sell_tax_pct: 20.0,
            buy_tax_pct: 15.0,
        }
    }
}

/// Complete engine configuration
#[derive(Debug, Clone)]
pub struct ScoringConfig {
    pub rule_points: RulePoints,
    pub rule_thresholds: RuleThresholds,
    pub weights: ComponentWeights,
    pub thresholds: ScoreThresholds,
    pub contract_thresholds: ContractThresholds,
    pub cache_ttl: Duration,
    pub request_timeout: Duration,
    pub top_features_limit: usize,
    /// Optional path to the serialized (classifier, transform) artifact
    pub model_path: Option<String>,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            rule_points: RulePoints::default(),
            rule_thresholds: RuleThresholds::default(),
            weights: ComponentWeights::default(),
            thresholds: ScoreThresholds::default(),
            contract_thresholds: ContractThresholds::default(),
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            top_features_limit: 5,
            model_path: None,
        }
    }
}

impl ScoringConfig {
    /// Defaults with environment overrides applied
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.cache_ttl =
            Duration::from_secs(env_parse("TXGUARD_CACHE_TTL_SECS", DEFAULT_CACHE_TTL_SECS));
        config.request_timeout = Duration::from_secs(env_parse(
            "TXGUARD_REQUEST_TIMEOUT_SECS",
            DEFAULT_REQUEST_TIMEOUT_SECS,
        ));
        config.thresholds.block = env_parse("TXGUARD_BLOCK_THRESHOLD", config.thresholds.block);
        config.thresholds.warn = env_parse("TXGUARD_WARN_THRESHOLD", config.thresholds.warn);
        config.top_features_limit =
            env_parse("TXGUARD_TOP_FEATURES", config.top_features_limit);
        config.model_path = std::env::var("TXGUARD_MODEL_PATH")
            .ok()
            .filter(|p| !p.is_empty());
        config
    }

    /// Reject configurations that would break scoring invariants
    pub fn validate(&self) -> AppResult<()> {
        let sum = self.weights.sum();
        if (sum - 1.0).abs() > 1e-6 {
            return Err(AppError::invalid_weights(format!(
                "Component weights sum to {:.6}, expected 1.0",
                sum
            )));
        }
        if self.thresholds.warn >= self.thresholds.block {
            return Err(AppError::new(
                crate::models::errors::ErrorCode::ConfigInvalidValue,
                "warn threshold must be below block threshold",
            ));
        }
        if self.rule_points.max_possible() == 0 {
            return Err(AppError::new(
                crate::models::errors::ErrorCode::ConfigInvalidValue,
                "rule point table must have at least one nonzero entry",
            ));
        }
        Ok(())
    }
}

fn env_parse<T: FromStr + Copy>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("Invalid value for {}, using default", key);
            default
        }),
        Err(_) => default,
    }
}
