//! Rule engine
//!
//! A fixed battery of independent boolean/threshold rules over the transaction
//! and its enriched facts. Additive point system: every fired rule contributes
//! its entry from the configured point table, and the final score is
//! `min(1.0, points / max_possible_points)` — all rules together saturate at
//! 1.0, partial triggers scale proportionally.
//!
//! Unknown facts are neutral: a rule that cannot see its input does not fire.
//! The one deliberate exception is recipient freshness, where the absence of
//! any transaction history is itself the signal.

use chrono::Timelike;

use crate::config::{RulePoints, RuleThresholds};
use crate::core::SignalHit;
use crate::models::types::{EnrichedFacts, Transaction, TriState};
use crate::utils::constants::{ADDRESS_BLACKLIST, RISKY_TOKENS};

/// Result of one rule evaluation pass
#[derive(Debug, Clone)]
pub struct RuleOutcome {
    /// Normalized [0,1]
    pub score: f64,
    /// Raw points before normalization
    pub points: u32,
    pub hits: Vec<SignalHit>,
}

/// Point-table rule battery
pub struct RuleEngine {
    points: RulePoints,
    thresholds: RuleThresholds,
}

impl RuleEngine {
    pub fn new(points: RulePoints, thresholds: RuleThresholds) -> Self {
        Self { points, thresholds }
    }

    pub fn evaluate(&self, tx: &Transaction, facts: &EnrichedFacts) -> RuleOutcome {
        let mut points = 0u32;
        let mut hits = Vec::new();

        let mut fire = |p: u32, id: &'static str, detail: String| {
            points += p;
            hits.push(SignalHit { id, detail });
        };

        // Deny list, either endpoint
        if ADDRESS_BLACKLIST.contains(tx.from_addr.as_str()) {
            fire(
                self.points.blacklist,
                "blacklisted_address",
                format!("sender {} is on the address deny list", tx.from_addr),
            );
        } else if ADDRESS_BLACKLIST.contains(tx.to_addr.as_str()) {
            fire(
                self.points.blacklist,
                "blacklisted_address",
                format!("recipient {} is on the address deny list", tx.to_addr),
            );
        }

        // Amount tiers, decreasing partial credit
        let t = &self.thresholds;
        if tx.amount_usd >= t.amount_tier_high {
            fire(
                self.points.high_amount,
                "high_amount",
                format!("very large transfer (${:.0})", tx.amount_usd),
            );
        } else if tx.amount_usd >= t.amount_tier_mid {
            fire(
                t.amount_points_mid,
                "high_amount",
                format!("large transfer (${:.0})", tx.amount_usd),
            );
        } else if tx.amount_usd >= t.amount_tier_low {
            fire(
                t.amount_points_low,
                "high_amount",
                format!("elevated transfer (${:.0})", tx.amount_usd),
            );
        }

        // Fresh recipient: no history at all, or first activity inside the window
        let fresh = match (facts.recipient_tx_count, facts.recipient_age_days) {
            (Some(0), _) => Some("recipient has no transaction history".to_string()),
            (_, Some(age)) if age < t.fresh_wallet_days => {
                Some(format!("recipient wallet is only {} days old", age))
            }
            _ => None,
        };
        if let Some(detail) = fresh {
            fire(self.points.fresh_wallet, "fresh_recipient", detail);
        }

        // Token reputation
        if RISKY_TOKENS.contains(tx.token_symbol.as_str()) {
            fire(
                self.points.risky_token,
                "risky_token",
                format!("{} is a high-volatility token", tx.token_symbol),
            );
        }

        // Unverified contract source (fires only on a confirmed "no")
        if tx.token_contract.is_some() && facts.contract_verified == TriState::No {
            fire(
                self.points.contract_unverified,
                "contract_unverified",
                "token contract source code is not verified".to_string(),
            );
        }

        // Self transfer
        if tx.is_self_transfer() {
            fire(
                self.points.self_transfer,
                "self_transfer",
                "sender and recipient are the same address".to_string(),
            );
        }

        // Odd-hour timing (UTC)
        let hour = tx.timestamp.hour();
        if hour < t.odd_hour_end || hour >= t.odd_hour_start {
            fire(
                self.points.odd_hour,
                "odd_hour",
                format!("submitted at {:02}:00 UTC", hour),
            );
        }

        // Rapid burst in the trailing hour
        let trailing_hour = facts
            .sender_history
            .iter()
            .filter(|r| {
                let delta = tx.timestamp.signed_duration_since(r.timestamp);
                delta.num_seconds() >= 0 && delta.num_seconds() <= 3_600
            })
            .count();
        if trailing_hour >= t.rapid_burst_count {
            fire(
                self.points.rapid_burst,
                "rapid_burst",
                format!("{} transfers from sender in the last hour", trailing_hour),
            );
        }

        // Dusting: negligible value from an unusually active sender
        if tx.amount_usd > 0.0
            && tx.amount_usd < t.dust_amount_usd
            && facts.sender_history.len() as u64 >= t.dust_activity_count
        {
            fire(
                self.points.dusting,
                "dusting",
                format!(
                    "dust-sized transfer (${:.2}) from a highly active sender",
                    tx.amount_usd
                ),
            );
        }

        // Large deviation from the sender's historical average
        if let Some(avg) = facts.sender_avg_tx_usd {
            if avg > 0.0 && tx.amount_usd / avg >= t.deviation_ratio {
                fire(
                    self.points.large_deviation,
                    "large_deviation",
                    format!(
                        "amount is {:.0}x the sender's historical average (${:.0})",
                        tx.amount_usd / avg,
                        avg
                    ),
                );
            }
        }

        let max = self.points.max_possible().max(1);
        RuleOutcome {
            score: (points as f64 / max as f64).min(1.0),
            points,
            hits,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::types::{Chain, Transaction, TxRecord};
    use chrono::{Duration, TimeZone, Utc};

    fn midday_tx(amount_usd: f64, from: &str, to: &str) -> Transaction {
        Transaction::new(
            Chain::Ethereum,
            from,
            to,
            "ETH",
            None,
            1.0,
            amount_usd,
            Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
        )
    }

    fn engine() -> RuleEngine {
        RuleEngine::new(RulePoints::default(), RuleThresholds::default())
    }

    fn ordinary_facts() -> EnrichedFacts {
        EnrichedFacts {
            wallet_tx_count: Some(120),
            wallet_age_days: Some(900),
            recipient_tx_count: Some(80),
            recipient_age_days: Some(700),
            sender_avg_tx_usd: Some(450.0),
            ..Default::default()
        }
    }

    #[test]
    fn test_ordinary_transfer_fires_nothing() {
        let tx = midday_tx(
            500.0,
            "0xaaa0000000000000000000000000000000000001",
            "0xbbb0000000000000000000000000000000000002",
        );
        let outcome = engine().evaluate(&tx, &ordinary_facts());
        assert_eq!(outcome.points, 0);
        assert_eq!(outcome.score, 0.0);
        assert!(outcome.hits.is_empty());
    }

    #[test]
    fn test_blacklisted_recipient() {
        let tx = midday_tx(
            500.0,
            "0xaaa0000000000000000000000000000000000001",
            "0x098b716b8aaf21512996dc57eb0615e2383e2f96",
        );
        let outcome = engine().evaluate(&tx, &ordinary_facts());
        assert!(outcome.hits.iter().any(|h| h.id == "blacklisted_address"));
        assert_eq!(outcome.points, RulePoints::default().blacklist);
    }

    #[test]
    fn test_amount_tiers_are_monotonic() {
        let facts = ordinary_facts();
        let e = engine();
        let amounts = [500.0, 1_000.0, 10_000.0, 100_000.0, 500_000.0];
        let mut last = -1.0;
        for amount in amounts {
            let tx = midday_tx(
                amount,
                "0xaaa0000000000000000000000000000000000001",
                "0xbbb0000000000000000000000000000000000002",
            );
            // Hold the deviation rule out of the comparison
            let mut facts = facts.clone();
            facts.sender_avg_tx_usd = None;
            let outcome = e.evaluate(&tx, &facts);
            assert!(
                outcome.score >= last,
                "rules score decreased at amount {}",
                amount
            );
            last = outcome.score;
        }
    }

    #[test]
    fn test_fresh_recipient_no_history() {
        let mut facts = ordinary_facts();
        facts.recipient_tx_count = Some(0);
        facts.recipient_age_days = None;
        let tx = midday_tx(
            500.0,
            "0xaaa0000000000000000000000000000000000001",
            "0xbbb0000000000000000000000000000000000002",
        );
        let outcome = engine().evaluate(&tx, &facts);
        assert!(outcome.hits.iter().any(|h| h.id == "fresh_recipient"));
    }

    #[test]
    fn test_fresh_recipient_young_wallet() {
        let mut facts = ordinary_facts();
        facts.recipient_tx_count = Some(5);
        facts.recipient_age_days = Some(3);
        let tx = midday_tx(
            500.0,
            "0xaaa0000000000000000000000000000000000001",
            "0xbbb0000000000000000000000000000000000002",
        );
        let outcome = engine().evaluate(&tx, &facts);
        assert!(outcome.hits.iter().any(|h| h.id == "fresh_recipient"));
    }

    #[test]
    fn test_unknown_recipient_facts_are_neutral() {
        let mut facts = ordinary_facts();
        facts.recipient_tx_count = None;
        facts.recipient_age_days = None;
        let tx = midday_tx(
            500.0,
            "0xaaa0000000000000000000000000000000000001",
            "0xbbb0000000000000000000000000000000000002",
        );
        let outcome = engine().evaluate(&tx, &facts);
        assert!(
            !outcome.hits.iter().any(|h| h.id == "fresh_recipient"),
            "a failed lookup must not be read as freshness"
        );
    }

    #[test]
    fn test_unverified_contract_requires_confirmed_no() {
        let tx = Transaction::new(
            Chain::Ethereum,
            "0xaaa0000000000000000000000000000000000001",
            "0xbbb0000000000000000000000000000000000002",
            "XYZ",
            Some("0xccc0000000000000000000000000000000000003"),
            1.0,
            500.0,
            Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
        );
        let e = engine();

        let mut facts = ordinary_facts();
        facts.contract_verified = TriState::Unknown;
        assert!(!e
            .evaluate(&tx, &facts)
            .hits
            .iter()
            .any(|h| h.id == "contract_unverified"));

        facts.contract_verified = TriState::No;
        assert!(e
            .evaluate(&tx, &facts)
            .hits
            .iter()
            .any(|h| h.id == "contract_unverified"));
    }

    #[test]
    fn test_odd_hour() {
        let tx = Transaction::new(
            Chain::Ethereum,
            "0xaaa0000000000000000000000000000000000001",
            "0xbbb0000000000000000000000000000000000002",
            "ETH",
            None,
            1.0,
            500.0,
            Utc.with_ymd_and_hms(2025, 6, 1, 2, 30, 0).unwrap(),
        );
        let outcome = engine().evaluate(&tx, &ordinary_facts());
        assert!(outcome.hits.iter().any(|h| h.id == "odd_hour"));
    }

    #[test]
    fn test_rapid_burst_trailing_hour_only() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let mut facts = ordinary_facts();
        // 10 transfers 30 minutes ago, plus old ones that must not count
        facts.sender_history = (0..10)
            .map(|_| TxRecord {
                timestamp: now - Duration::minutes(30),
                amount_usd: 10.0,
            })
            .chain((0..10).map(|_| TxRecord {
                timestamp: now - Duration::hours(5),
                amount_usd: 10.0,
            }))
            .collect();
        let tx = midday_tx(
            500.0,
            "0xaaa0000000000000000000000000000000000001",
            "0xbbb0000000000000000000000000000000000002",
        );
        let outcome = engine().evaluate(&tx, &facts);
        let hit = outcome
            .hits
            .iter()
            .find(|h| h.id == "rapid_burst")
            .expect("burst fires");
        assert!(hit.detail.contains("10 transfers"));
    }

    #[test]
    fn test_dusting() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let mut facts = ordinary_facts();
        facts.sender_avg_tx_usd = None;
        facts.sender_history = (0..25)
            .map(|i| TxRecord {
                timestamp: now - Duration::hours(i + 2),
                amount_usd: 0.5,
            })
            .collect();
        let tx = midday_tx(
            0.25,
            "0xaaa0000000000000000000000000000000000001",
            "0xbbb0000000000000000000000000000000000002",
        );
        let outcome = engine().evaluate(&tx, &facts);
        assert!(outcome.hits.iter().any(|h| h.id == "dusting"));
    }

    #[test]
    fn test_large_deviation() {
        let mut facts = ordinary_facts();
        facts.sender_avg_tx_usd = Some(100.0);
        let tx = midday_tx(
            1_500.0,
            "0xaaa0000000000000000000000000000000000001",
            "0xbbb0000000000000000000000000000000000002",
        );
        let outcome = engine().evaluate(&tx, &facts);
        assert!(outcome.hits.iter().any(|h| h.id == "large_deviation"));
    }

    #[test]
    fn test_score_normalization_and_cap() {
        // Everything fires at once: score must saturate, never exceed 1.0
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 23, 30, 0).unwrap();
        let mut facts = EnrichedFacts {
            recipient_tx_count: Some(0),
            sender_avg_tx_usd: Some(1.0),
            contract_verified: TriState::No,
            ..Default::default()
        };
        facts.sender_history = (0..30)
            .map(|_| TxRecord {
                timestamp: now - Duration::minutes(10),
                amount_usd: 1.0,
            })
            .collect();
        let tx = Transaction::new(
            Chain::Ethereum,
            "0x098b716b8aaf21512996dc57eb0615e2383e2f96",
            "0x098b716b8aaf21512996dc57eb0615e2383e2f96",
            "SQUID",
            Some("0xccc0000000000000000000000000000000000003"),
            1.0,
            150_000.0,
            now,
        );
        let outcome = engine().evaluate(&tx, &facts);
        assert!(outcome.score <= 1.0);
        assert!(outcome.score > 0.7, "most of the table fired");
    }
}
