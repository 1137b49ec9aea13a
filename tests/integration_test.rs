//! Integration tests for the txguard scoring engine

use chrono::{Duration, TimeZone, Utc};
use std::sync::Arc;

use txguard::models::types::{Action, Chain, Component, RiskLabel, TokenMeta, Transaction, TxRecord};
use txguard::providers::memory::{ContractFixture, MemoryProvider, WalletFixture};
use txguard::{RiskScorer, ScoringConfig, SequenceModel, TriState};

fn midday() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
}

const SENDER: &str = "0x47ac0fb4f2d84898e4d9e7b4dab3c24507a6d503";
const RECIPIENT: &str = "0x8576acc5c05d6ce88f4e49bf65bdf0c62f91353c";
const BLACKLISTED: &str = "0x098b716b8aaf21512996dc57eb0615e2383e2f96";
const CLUSTER_MEMBER: &str = "0x111aaa0000000000000000000000000000000001";

fn settled(tx_count: u64, age_days: i64) -> WalletFixture {
    let history = (1..=6)
        .map(|i| TxRecord {
            timestamp: midday() - Duration::days(i),
            amount_usd: 400.0 + i as f64 * 20.0,
        })
        .collect();
    WalletFixture {
        tx_count,
        age_days,
        history,
    }
}

fn fixture_scorer() -> RiskScorer {
    let provider = MemoryProvider::new()
        .with_wallet(SENDER, settled(340, 1_200))
        .with_wallet(RECIPIENT, settled(85, 700));
    RiskScorer::new(ScoringConfig::default(), Arc::new(provider)).unwrap()
}

fn transfer(amount_usd: f64, to: &str) -> Transaction {
    Transaction::new(
        Chain::Ethereum,
        SENDER,
        to,
        "ETH",
        None,
        amount_usd / 2_500.0,
        amount_usd,
        midday(),
    )
}

#[tokio::test]
async fn score_and_components_stay_bounded() {
    let scorer = fixture_scorer();
    for amount in [0.0, 0.5, 500.0, 9_999.0, 150_000.0, 1e9] {
        let verdict = scorer.score_pre_transaction(&transfer(amount, RECIPIENT)).await;
        assert!(
            (0.0..=100.0).contains(&verdict.risk_score),
            "risk_score {} out of bounds at amount {}",
            verdict.risk_score,
            amount
        );
        for component in Component::ALL {
            let score = verdict.component_scores.get(component);
            assert!(
                (0.0..=1.0).contains(&score),
                "{:?} out of bounds: {}",
                component,
                score
            );
        }
    }
}

#[tokio::test]
async fn identical_inputs_reproduce_the_verdict() {
    let scorer = fixture_scorer();
    let tx = transfer(12_345.0, RECIPIENT);

    let first = scorer.score_pre_transaction(&tx).await;
    let second = scorer.score_pre_transaction(&tx).await;

    assert_eq!(first.risk_score, second.risk_score);
    assert_eq!(first.risk_label, second.risk_label);
    assert_eq!(first.action, second.action);
    assert_eq!(first.component_scores, second.component_scores);
    assert_eq!(first.reason_text, second.reason_text);
    assert_eq!(first.top_features.len(), second.top_features.len());
}

#[tokio::test]
async fn rules_and_tabular_grow_monotonically_across_tiers() {
    let scorer = fixture_scorer();
    let mut last_rules = -1.0;
    let mut last_tabular = -1.0;
    // Everything but the amount is held fixed; the deviation rule may join in
    // as the amount grows, which only ever adds points
    for amount in [500.0, 1_000.0, 5_000.0, 10_000.0, 50_000.0, 100_000.0, 900_000.0] {
        let verdict = scorer.score_pre_transaction(&transfer(amount, RECIPIENT)).await;
        assert!(
            verdict.component_scores.rules >= last_rules,
            "rules decreased at {}",
            amount
        );
        assert!(
            verdict.component_scores.tabular >= last_tabular,
            "tabular decreased at {}",
            amount
        );
        last_rules = verdict.component_scores.rules;
        last_tabular = verdict.component_scores.tabular;
    }
}

#[tokio::test]
async fn label_always_matches_action() {
    let scorer = fixture_scorer();
    for (amount, to) in [
        (500.0, RECIPIENT),
        (50_000.0, RECIPIENT),
        (150_000.0, BLACKLISTED),
        (0.2, CLUSTER_MEMBER),
    ] {
        let verdict = scorer.score_pre_transaction(&transfer(amount, to)).await;
        match verdict.risk_label {
            RiskLabel::HighRisk => {
                assert!(verdict.risk_score >= 85.0);
                assert_eq!(verdict.action, Action::Block);
            }
            RiskLabel::Suspicious => {
                assert!(verdict.risk_score >= 60.0 && verdict.risk_score < 85.0);
                assert_eq!(verdict.action, Action::Warn);
            }
            RiskLabel::Safe => {
                assert!(verdict.risk_score < 60.0);
                assert_eq!(verdict.action, Action::Allow);
            }
        }
    }
}

#[tokio::test]
async fn total_provider_outage_degrades_gracefully() {
    let scorer =
        RiskScorer::new(ScoringConfig::default(), Arc::new(MemoryProvider::failing())).unwrap();
    let verdict = scorer.score_pre_transaction(&transfer(500.0, RECIPIENT)).await;

    // No exception reached us, and the history-dependent components sit at
    // their neutral defaults
    assert_eq!(verdict.component_scores.sequence, 0.10);
    assert_eq!(verdict.component_scores.graph, 0.0);
    assert!(verdict.reason_text.contains("degraded"));
}

#[tokio::test]
async fn small_ordinary_transfer_is_allowed() {
    let scorer = fixture_scorer();
    let verdict = scorer.score_pre_transaction(&transfer(500.0, RECIPIENT)).await;
    assert_eq!(verdict.risk_label, RiskLabel::Safe);
    assert_eq!(verdict.action, Action::Allow);
}

#[tokio::test]
async fn large_transfer_to_blacklisted_recipient_blocks() {
    let scorer = fixture_scorer();
    let verdict = scorer
        .score_pre_transaction(&transfer(150_000.0, BLACKLISTED))
        .await;

    assert!(verdict.risk_score >= 85.0);
    assert_eq!(verdict.action, Action::Block);
    assert!(
        verdict
            .top_features
            .iter()
            .any(|f| f.name == "blacklisted_address"),
        "blacklist identifier missing from: {:?}",
        verdict.top_features
    );
    assert!(verdict.reason_text.contains("deny list"));
}

#[tokio::test]
async fn graph_component_equals_cluster_base_risk_on_exact_match() {
    let provider = MemoryProvider::new().with_wallet(RECIPIENT, settled(85, 700));
    let scorer = RiskScorer::new(ScoringConfig::default(), Arc::new(provider)).unwrap();
    let tx = Transaction::new(
        Chain::Ethereum,
        CLUSTER_MEMBER,
        RECIPIENT,
        "ETH",
        None,
        0.2,
        500.0,
        midday(),
    );

    let verdict = scorer.score_pre_transaction(&tx).await;
    assert_eq!(verdict.component_scores.graph, 0.95);
}

#[tokio::test]
async fn honeypot_sell_tax_surfaces_in_contract_component() {
    let contract = "0xccc0000000000000000000000000000000000003";
    let provider = MemoryProvider::new()
        .with_wallet(SENDER, settled(340, 1_200))
        .with_wallet(RECIPIENT, settled(85, 700))
        .with_contract(
            contract,
            ContractFixture {
                verified: true,
                meta: TokenMeta {
                    buy_tax: Some(2.0),
                    sell_tax: Some(25.0),
                    owner_renounced: TriState::Yes,
                },
            },
        );
    let scorer = RiskScorer::new(ScoringConfig::default(), Arc::new(provider)).unwrap();
    let tx = Transaction::new(
        Chain::Ethereum,
        SENDER,
        RECIPIENT,
        "XYZ",
        Some(contract),
        100.0,
        500.0,
        midday(),
    );

    let verdict = scorer.score_pre_transaction(&tx).await;
    assert!(
        verdict.component_scores.contract >= 0.6,
        "contract component {} misses the honeypot-tax contribution",
        verdict.component_scores.contract
    );
    assert!(verdict.reason_text.contains("sell tax"));
}

#[tokio::test]
async fn short_history_pins_sequence_at_neutral() {
    // Direct model contract
    let model = SequenceModel::new();
    assert_eq!(model.score(&[], 1e9), 0.10);
    assert_eq!(model.score(&[5.0, 7.0], 1e9), 0.10);

    // And end-to-end: a sender with two historical transfers
    let provider = MemoryProvider::new().with_wallet(
        SENDER,
        WalletFixture {
            tx_count: 2,
            age_days: 90,
            history: vec![
                TxRecord {
                    timestamp: midday() - Duration::days(2),
                    amount_usd: 10.0,
                },
                TxRecord {
                    timestamp: midday() - Duration::days(4),
                    amount_usd: 12.0,
                },
            ],
        },
    );
    let scorer = RiskScorer::new(ScoringConfig::default(), Arc::new(provider)).unwrap();
    let verdict = scorer
        .score_pre_transaction(&transfer(1_000_000.0, RECIPIENT))
        .await;
    assert_eq!(verdict.component_scores.sequence, 0.10);
}

#[tokio::test]
async fn repeated_scoring_hits_the_gateway_cache() {
    let scorer = fixture_scorer();
    let tx = transfer(500.0, RECIPIENT);
    scorer.score_pre_transaction(&tx).await;
    let misses_before = scorer.cache_stats().misses;
    scorer.score_pre_transaction(&tx).await;
    let stats = scorer.cache_stats();
    assert_eq!(stats.misses, misses_before, "second pass must not refetch");
    assert!(stats.hits > 0);
}
