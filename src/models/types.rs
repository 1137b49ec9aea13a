//! Type definitions for the txguard scoring engine
//! All core data structures for pre-transaction risk analysis

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::address::normalize_address;

/// Supported blockchain networks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Chain {
    Ethereum,
    Bsc,
    Polygon,
}

impl Chain {
    /// Parse a chain name through the fixed alias table.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "ethereum" | "eth" | "mainnet" => Some(Self::Ethereum),
            "bsc" | "binance" | "bnb" => Some(Self::Bsc),
            "polygon" | "matic" => Some(Self::Polygon),
            _ => None,
        }
    }

    /// Short slug sent to the underlying chain-data provider
    pub fn api_slug(&self) -> &'static str {
        match self {
            Self::Ethereum => "eth",
            Self::Bsc => "bsc",
            Self::Polygon => "polygon",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Ethereum => "Ethereum",
            Self::Bsc => "BNB Smart Chain",
            Self::Polygon => "Polygon",
        }
    }
}

/// A proposed transfer, immutable once constructed.
/// Addresses are lowercased and the token symbol uppercased on construction,
/// so every downstream comparison works on canonical forms.
#[derive(Debug, Clone, Serialize)]
pub struct Transaction {
    pub chain: Chain,
    pub from_addr: String,
    pub to_addr: String,
    pub token_symbol: String,
    pub token_contract: Option<String>,
    pub amount: f64,
    pub amount_usd: f64,
    pub timestamp: DateTime<Utc>,
}

impl Transaction {
    /// Build a normalized transaction. Negative or non-finite USD amounts are
    /// coerced to 0 (a partial verdict is more useful than a rejected call).
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        chain: Chain,
        from_addr: &str,
        to_addr: &str,
        token_symbol: &str,
        token_contract: Option<&str>,
        amount: f64,
        amount_usd: f64,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            chain,
            from_addr: normalize_address(from_addr),
            to_addr: normalize_address(to_addr),
            token_symbol: token_symbol.trim().to_uppercase(),
            token_contract: token_contract
                .map(normalize_address)
                .filter(|c| !c.is_empty()),
            amount: if amount.is_finite() { amount.max(0.0) } else { 0.0 },
            amount_usd: if amount_usd.is_finite() { amount_usd.max(0.0) } else { 0.0 },
            timestamp,
        }
    }

    /// Self-transfer check on canonical addresses
    pub fn is_self_transfer(&self) -> bool {
        !self.from_addr.is_empty() && self.from_addr == self.to_addr
    }
}

/// Three-valued fact: a boolean whose absence is meaningful.
/// `Unknown` must never be read as "risky" or as "safe".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriState {
    Yes,
    No,
    #[default]
    Unknown,
}

impl TriState {
    pub fn from_bool(b: bool) -> Self {
        if b {
            Self::Yes
        } else {
            Self::No
        }
    }
}

/// One historical transfer of an address, as reported by the provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TxRecord {
    pub timestamp: DateTime<Utc>,
    pub amount_usd: f64,
}

/// Token contract metadata used by the contract risk model
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenMeta {
    pub buy_tax: Option<f64>,
    pub sell_tax: Option<f64>,
    pub owner_renounced: TriState,
}

/// On-chain facts gathered for one transaction before scoring.
/// Every field is optional; `None`/`Unknown` means the lookup failed or the
/// provider had nothing, and downstream models treat it as neutral.
#[derive(Debug, Clone, Default)]
pub struct EnrichedFacts {
    pub wallet_tx_count: Option<u64>,
    pub wallet_age_days: Option<i64>,
    pub recipient_tx_count: Option<u64>,
    pub recipient_age_days: Option<i64>,
    pub sender_avg_tx_usd: Option<f64>,
    /// Recent sender transfers, newest first
    pub sender_history: Vec<TxRecord>,
    pub contract_verified: TriState,
    pub token_meta: Option<TokenMeta>,
    /// Degraded-mode markers, surfaced verbatim into the verdict reasons
    pub failures: Vec<String>,
}

impl EnrichedFacts {
    pub fn record_failure(&mut self, what: &str) {
        self.failures.push(format!("degraded:{}", what));
    }

    pub fn is_degraded(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// The five ensemble signals
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    Rules,
    Tabular,
    Sequence,
    Graph,
    Contract,
}

impl Component {
    pub const ALL: [Component; 5] = [
        Component::Rules,
        Component::Tabular,
        Component::Sequence,
        Component::Graph,
        Component::Contract,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Component::Rules => "rules",
            Component::Tabular => "tabular",
            Component::Sequence => "sequence",
            Component::Graph => "graph",
            Component::Contract => "contract",
        }
    }
}

/// Normalized [0,1] score per component
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ComponentScores {
    pub rules: f64,
    pub tabular: f64,
    pub sequence: f64,
    pub graph: f64,
    pub contract: f64,
}

impl ComponentScores {
    pub fn get(&self, component: Component) -> f64 {
        match component {
            Component::Rules => self.rules,
            Component::Tabular => self.tabular,
            Component::Sequence => self.sequence,
            Component::Graph => self.graph,
            Component::Contract => self.contract,
        }
    }

    /// Component scores are [0,1] by contract; clamp at this boundary
    pub fn set(&mut self, component: Component, score: f64) {
        let slot = match component {
            Component::Rules => &mut self.rules,
            Component::Tabular => &mut self.tabular,
            Component::Sequence => &mut self.sequence,
            Component::Graph => &mut self.graph,
            Component::Contract => &mut self.contract,
        };
        *slot = score.clamp(0.0, 1.0);
    }
}

/// One entry of the ranked contribution breakdown
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopFeature {
    pub name: String,
    pub value: String,
    pub impact: f64,
}

/// Categorical risk label derived from the final score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLabel {
    Safe,
    Suspicious,
    HighRisk,
}

impl RiskLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLabel::Safe => "safe",
            RiskLabel::Suspicious => "suspicious",
            RiskLabel::HighRisk => "high_risk",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            RiskLabel::Safe => "✅",
            RiskLabel::Suspicious => "🟠",
            RiskLabel::HighRisk => "🔴",
        }
    }
}

/// Recommended action, always consistent with the label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Allow,
    Warn,
    Block,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Allow => "allow",
            Action::Warn => "warn",
            Action::Block => "block",
        }
    }
}

/// Final scoring verdict for one transaction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Verdict {
    /// Overall score, 0-100, two decimals
    pub risk_score: f64,
    pub risk_label: RiskLabel,
    pub action: Action,
    pub component_scores: ComponentScores,
    /// Contributions ranked by impact, truncated
    pub top_features: Vec<TopFeature>,
    /// All fired reasons joined with "; ", or the canned no-flags string
    pub reason_text: String,
}

impl Verdict {
    /// Pretty print for CLI output
    pub fn summary(&self) -> String {
        let mut output = format!(
            "\n{} Risk: {:.2}/100 ({}) → {}\n",
            self.risk_label.emoji(),
            self.risk_score,
            self.risk_label.as_str(),
            self.action.as_str().to_uppercase(),
        );
        output.push_str(&format!(
            "   Components | rules: {:.3} | tabular: {:.3} | sequence: {:.3} | graph: {:.3} | contract: {:.3}\n",
            self.component_scores.rules,
            self.component_scores.tabular,
            self.component_scores.sequence,
            self.component_scores.graph,
            self.component_scores.contract,
        ));
        if !self.top_features.is_empty() {
            output.push_str("   Top contributors:\n");
            for feature in &self.top_features {
                output.push_str(&format!(
                    "     - {} ({}) impact {:.3}\n",
                    feature.name, feature.value, feature.impact
                ));
            }
        }
        output.push_str(&format!("   Reasons: {}\n", self.reason_text));
        output
    }
}
