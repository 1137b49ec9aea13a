//! Risk aggregator — the heart of txguard
//!
//! Orchestrates one scoring pass: enrich the transaction with on-chain facts,
//! evaluate the five independent sub-models, normalize and combine them under
//! the configured weight vector, and assemble an auditable verdict.
//!
//! Failure isolation: no sub-model or provider failure ever aborts the
//! verdict. A degraded signal contributes its declared neutral value and is
//! flagged in the reason text. The worst case under total environmental
//! failure is a verdict computed from rules and the amount heuristic alone.

use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use crate::config::ScoringConfig;
use crate::core::contract::ContractRiskModel;
use crate::core::graph::GraphReputationModel;
use crate::core::rules::RuleEngine;
use crate::core::sequence::SequenceModel;
use crate::core::tabular::{TabularModel, TabularOutcome};
use crate::core::SignalHit;
use crate::models::errors::AppResult;
use crate::models::types::{
    Component, ComponentScores, TopFeature, Transaction, Verdict,
};
use crate::providers::{ChainDataGateway, ChainDataProvider};
use crate::utils::cache::CacheStats;
use crate::utils::constants::reason_impact;

const NO_FLAGS_TEXT: &str = "No risk flags raised.";

/// Hard signals that escalate straight past the weighted ensemble.
/// A deny list must mean "deny": a single rule's share of the point table can
/// never lift the weighted sum over the block threshold on its own.
const HARD_SIGNALS: [&str; 2] = ["blacklisted_address", "contract_blacklisted"];

/// Pre-transaction risk scorer
pub struct RiskScorer {
    config: ScoringConfig,
    gateway: ChainDataGateway,
    rules: RuleEngine,
    tabular: TabularModel,
    sequence: SequenceModel,
    graph: GraphReputationModel,
    contract: ContractRiskModel,
}

impl RiskScorer {
    /// Build a scorer over the given provider. Validates the configuration
    /// and selects the tabular variant once, up front.
    pub fn new(config: ScoringConfig, provider: Arc<dyn ChainDataProvider>) -> AppResult<Self> {
        config.validate()?;
        let gateway = ChainDataGateway::new(provider, config.cache_ttl);
        let tabular = TabularModel::from_artifact_path(config.model_path.as_deref());
        Ok(Self {
            rules: RuleEngine::new(config.rule_points.clone(), config.rule_thresholds.clone()),
            contract: ContractRiskModel::new(config.contract_thresholds.clone()),
            sequence: SequenceModel::new(),
            graph: GraphReputationModel::new(),
            tabular,
            gateway,
            config,
        })
    }

    /// Replace the built-in reputation clusters
    pub fn with_graph(mut self, graph: GraphReputationModel) -> Self {
        self.graph = graph;
        self
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.gateway.cache_stats()
    }

    /// The single entry point consumed by the presentation layer
    pub async fn score_pre_transaction(&self, tx: &Transaction) -> Verdict {
        let started = Instant::now();
        let facts = self.gateway.enrich(tx).await;

        // The five signals are mutually independent; evaluation after the
        // enrichment join is cheap synchronous work
        let rule_outcome = self.rules.evaluate(tx, &facts);

        let tabular_outcome = self.tabular.predict(tx, &facts);

        let history: Vec<f64> = facts.sender_history.iter().map(|r| r.amount_usd).collect();
        let sequence_score = self.sequence.score(&history, tx.amount_usd);

        let graph_score = self
            .graph
            .score(&tx.from_addr)
            .max(self.graph.score(&tx.to_addr));

        let contract_outcome = self.contract.score(tx, &facts);

        let mut components = ComponentScores::default();
        components.set(Component::Rules, rule_outcome.score);
        components.set(Component::Tabular, tabular_outcome.value());
        components.set(Component::Sequence, sequence_score);
        components.set(Component::Graph, graph_score);
        components.set(Component::Contract, contract_outcome.score);

        let weights = &self.config.weights;
        let weighted = components.rules * weights.rules
            + components.tabular * weights.tabular
            + components.sequence * weights.sequence
            + components.graph * weights.graph
            + components.contract * weights.contract;

        let mut risk_score = round2((weighted * 100.0).clamp(0.0, 100.0));

        // Informational hits never enter reasons or the ranking
        let fired: Vec<&SignalHit> = rule_outcome
            .hits
            .iter()
            .chain(contract_outcome.hits.iter())
            .filter(|h| h.id != "no_contract")
            .collect();

        // Deny-list escalation
        if fired.iter().any(|h| HARD_SIGNALS.contains(&h.id)) {
            risk_score = risk_score.max(self.config.thresholds.block);
        }

        let (risk_label, action) = self.config.thresholds.classify(risk_score);

        let top_features = self.rank_features(&fired, &components);
        let reason_text = build_reason_text(&fired, &tabular_outcome, &facts.failures);

        debug!(
            "Scored {} -> {} in {}ms",
            tx.from_addr,
            risk_score,
            started.elapsed().as_millis()
        );
        if action != crate::models::types::Action::Allow {
            info!(
                "🚨 {} transfer flagged: {:.2}/100 ({})",
                tx.token_symbol, risk_score, reason_text
            );
        }

        Verdict {
            risk_score,
            risk_label,
            action,
            component_scores: components,
            top_features,
            reason_text,
        }
    }

    /// Rank fired signals by their fixed impact weights, then component
    /// contributions by weighted share, and keep the configured top slice
    fn rank_features(&self, fired: &[&SignalHit], components: &ComponentScores) -> Vec<TopFeature> {
        let weights = &self.config.weights;
        let mut features: Vec<TopFeature> = fired
            .iter()
            .map(|hit| TopFeature {
                name: hit.id.to_string(),
                value: hit.detail.clone(),
                impact: reason_impact(hit.id),
            })
            .collect();

        for component in Component::ALL {
            let score = components.get(component);
            if score <= 0.0 {
                continue;
            }
            let weight = match component {
                Component::Rules => weights.rules,
                Component::Tabular => weights.tabular,
                Component::Sequence => weights.sequence,
                Component::Graph => weights.graph,
                Component::Contract => weights.contract,
            };
            features.push(TopFeature {
                name: format!("{}_component", component.as_str()),
                value: format!("{:.3}", score),
                impact: round3(weight * score),
            });
        }

        features.sort_by(|a, b| b.impact.total_cmp(&a.impact));
        features.truncate(self.config.top_features_limit);
        features
    }
}

fn build_reason_text(
    fired: &[&SignalHit],
    tabular: &TabularOutcome,
    failures: &[String],
) -> String {
    let mut parts: Vec<String> = fired.iter().map(|h| h.detail.clone()).collect();
    if let TabularOutcome::Degraded { reason, .. } = tabular {
        parts.push(format!("tabular model degraded ({})", reason));
    }
    parts.extend(failures.iter().cloned());

    if parts.is_empty() {
        NO_FLAGS_TEXT.to_string()
    } else {
        parts.join("; ")
    }
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

fn round3(x: f64) -> f64 {
    (x * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::types::{Action, Chain, RiskLabel, TxRecord};
    use crate::providers::memory::{MemoryProvider, WalletFixture};
    use chrono::{TimeZone, Utc};

    fn midday() -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    fn scorer_with(provider: MemoryProvider) -> RiskScorer {
        RiskScorer::new(ScoringConfig::default(), Arc::new(provider)).unwrap()
    }

    fn settled_wallet(addr_suffix: u8) -> (String, WalletFixture) {
        let address = format!("0x{:040x}", 0xaa00 + addr_suffix as u64);
        let history = (1..=6)
            .map(|i| TxRecord {
                timestamp: midday() - chrono::Duration::days(i),
                amount_usd: 400.0 + i as f64 * 20.0,
            })
            .collect();
        (
            address,
            WalletFixture {
                tx_count: 200,
                age_days: 800,
                history,
            },
        )
    }

    #[tokio::test]
    async fn test_ordinary_transfer_is_safe() {
        let (from, from_fix) = settled_wallet(1);
        let (to, to_fix) = settled_wallet(2);
        let scorer = scorer_with(
            MemoryProvider::new()
                .with_wallet(&from, from_fix)
                .with_wallet(&to, to_fix),
        );
        let tx = Transaction::new(Chain::Ethereum, &from, &to, "ETH", None, 0.2, 500.0, midday());

        let verdict = scorer.score_pre_transaction(&tx).await;
        assert_eq!(verdict.risk_label, RiskLabel::Safe);
        assert_eq!(verdict.action, Action::Allow);
        assert!(verdict.risk_score < 60.0);
        assert_eq!(verdict.reason_text, NO_FLAGS_TEXT);
    }

    #[tokio::test]
    async fn test_blacklisted_recipient_blocks() {
        let (from, from_fix) = settled_wallet(1);
        let scorer = scorer_with(MemoryProvider::new().with_wallet(&from, from_fix));
        let tx = Transaction::new(
            Chain::Ethereum,
            &from,
            "0x098b716b8aaf21512996dc57eb0615e2383e2f96",
            "ETH",
            None,
            60.0,
            150_000.0,
            midday(),
        );

        let verdict = scorer.score_pre_transaction(&tx).await;
        assert!(verdict.risk_score >= 85.0);
        assert_eq!(verdict.action, Action::Block);
        assert_eq!(verdict.risk_label, RiskLabel::HighRisk);
        assert!(verdict.reason_text.contains("deny list"));
        assert!(verdict
            .top_features
            .iter()
            .any(|f| f.name == "blacklisted_address"));
    }

    #[tokio::test]
    async fn test_determinism_against_frozen_snapshot() {
        let (from, from_fix) = settled_wallet(1);
        let (to, to_fix) = settled_wallet(2);
        let scorer = scorer_with(
            MemoryProvider::new()
                .with_wallet(&from, from_fix)
                .with_wallet(&to, to_fix),
        );
        let tx = Transaction::new(
            Chain::Ethereum,
            &from,
            &to,
            "SHIB",
            None,
            9.0,
            12_000.0,
            midday(),
        );

        let first = scorer.score_pre_transaction(&tx).await;
        let second = scorer.score_pre_transaction(&tx).await;
        assert_eq!(first.risk_score, second.risk_score);
        assert_eq!(first.component_scores, second.component_scores);
        assert_eq!(first.reason_text, second.reason_text);
    }

    #[tokio::test]
    async fn test_graph_component_on_exact_cluster_member() {
        let (to, to_fix) = settled_wallet(2);
        let member = "0x111aaa0000000000000000000000000000000001";
        let scorer = scorer_with(MemoryProvider::new().with_wallet(&to, to_fix));
        let tx = Transaction::new(Chain::Ethereum, member, &to, "ETH", None, 0.2, 500.0, midday());

        let verdict = scorer.score_pre_transaction(&tx).await;
        assert_eq!(verdict.component_scores.graph, 0.95);
    }

    #[tokio::test]
    async fn test_total_outage_still_produces_verdict() {
        let scorer = scorer_with(MemoryProvider::failing());
        let tx = Transaction::new(
            Chain::Ethereum,
            "0xaaa0000000000000000000000000000000000001",
            "0xbbb0000000000000000000000000000000000002",
            "ETH",
            None,
            0.2,
            500.0,
            midday(),
        );

        let verdict = scorer.score_pre_transaction(&tx).await;
        // Neutral defaults for the history-dependent components
        assert_eq!(verdict.component_scores.sequence, 0.10);
        assert_eq!(verdict.component_scores.graph, 0.0);
        assert!(verdict.reason_text.contains("degraded"));
        assert!((0.0..=100.0).contains(&verdict.risk_score));
    }

    #[tokio::test]
    async fn test_label_action_consistency() {
        // Sweep a spread of constructed scenarios and check the invariant
        let scorer = scorer_with(MemoryProvider::new());
        for amount in [0.0, 500.0, 5_000.0, 50_000.0, 500_000.0] {
            let tx = Transaction::new(
                Chain::Ethereum,
                "0xaaa0000000000000000000000000000000000001",
                "0xbbb0000000000000000000000000000000000002",
                "SQUID",
                None,
                1.0,
                amount,
                midday(),
            );
            let verdict = scorer.score_pre_transaction(&tx).await;
            match verdict.action {
                Action::Block => assert!(verdict.risk_score >= 85.0),
                Action::Warn => {
                    assert!(verdict.risk_score >= 60.0 && verdict.risk_score < 85.0)
                }
                Action::Allow => assert!(verdict.risk_score < 60.0),
            }
        }
    }

    #[tokio::test]
    async fn test_top_features_bounded_and_sorted() {
        let scorer = scorer_with(MemoryProvider::new());
        let tx = Transaction::new(
            Chain::Ethereum,
            "0x098b716b8aaf21512996dc57eb0615e2383e2f96",
            "0x098b716b8aaf21512996dc57eb0615e2383e2f96",
            "SQUID",
            Some("0x3f17f1962b36e491b30a40b2405849e597ba5fb5"),
            60.0,
            150_000.0,
            Utc.with_ymd_and_hms(2025, 6, 1, 23, 30, 0).unwrap(),
        );
        let verdict = scorer.score_pre_transaction(&tx).await;
        assert!(verdict.top_features.len() <= 5);
        for pair in verdict.top_features.windows(2) {
            assert!(pair[0].impact >= pair[1].impact);
        }
        assert_eq!(verdict.top_features[0].name, "blacklisted_address");
    }

    #[tokio::test]
    async fn test_score_bounds_hold_everywhere() {
        let scorer = scorer_with(MemoryProvider::new());
        for amount in [0.0, 1.0, 999.0, 1e5, 1e9] {
            let tx = Transaction::new(
                Chain::Ethereum,
                "0x098b716b8aaf21512996dc57eb0615e2383e2f96",
                "0x111aaa0000000000000000000000000000000001",
                "SQUID",
                Some("0x3f17f1962b36e491b30a40b2405849e597ba5fb5"),
                1.0,
                amount,
                midday(),
            );
            let verdict = scorer.score_pre_transaction(&tx).await;
            assert!((0.0..=100.0).contains(&verdict.risk_score));
            for component in Component::ALL {
                let score = verdict.component_scores.get(component);
                assert!((0.0..=1.0).contains(&score), "{:?} = {}", component, score);
            }
        }
    }
}
