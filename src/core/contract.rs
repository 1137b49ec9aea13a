//! Contract risk model
//!
//! Static heuristics over a token contract's metadata. Additive signal set
//! with saturation at 1.0:
//! - deny-listed contract (+0.9)
//! - major token symbol on an unrecognized contract, "impersonation" (+0.4)
//! - honeypot-grade sell tax (+0.6) or high buy tax (+0.4)
//! - contract ownership not renounced (+0.3)
//!
//! Tax and ownership facts come from the gateway's token metadata; unknown
//! values contribute nothing.

use crate::config::ContractThresholds;
use crate::core::SignalHit;
use crate::models::types::{EnrichedFacts, Transaction, TriState};
use crate::utils::constants::{CONTRACT_BLACKLIST, MAJOR_TOKENS};

/// Result of one contract analysis pass
#[derive(Debug, Clone)]
pub struct ContractOutcome {
    /// Normalized [0,1]
    pub score: f64,
    pub hits: Vec<SignalHit>,
}

pub struct ContractRiskModel {
    thresholds: ContractThresholds,
}

impl ContractRiskModel {
    pub fn new(thresholds: ContractThresholds) -> Self {
        Self { thresholds }
    }

    pub fn score(&self, tx: &Transaction, facts: &EnrichedFacts) -> ContractOutcome {
        let contract = match tx.token_contract.as_deref() {
            Some(c) if !c.is_empty() => c,
            _ => {
                return ContractOutcome {
                    score: 0.0,
                    hits: vec![SignalHit {
                        id: "no_contract",
                        detail: "no token contract address provided".to_string(),
                    }],
                }
            }
        };

        let mut score: f64 = 0.0;
        let mut hits = Vec::new();

        if CONTRACT_BLACKLIST.contains(contract) {
            score += 0.9;
            hits.push(SignalHit {
                id: "contract_blacklisted",
                detail: format!("contract {} is on the contract deny list", contract),
            });
        }

        // A well-known symbol on an address that is not the genuine contract
        // is the classic impersonation pattern
        if let Some(genuine) = MAJOR_TOKENS.get(tx.token_symbol.as_str()) {
            let impersonating = match genuine {
                Some(addr) => *addr != contract,
                None => true, // native assets have no legitimate token contract
            };
            if impersonating {
                score += 0.4;
                hits.push(SignalHit {
                    id: "symbol_impersonation",
                    detail: format!(
                        "{} symbol on an unrecognized contract address",
                        tx.token_symbol
                    ),
                });
            }
        }

        if let Some(meta) = &facts.token_meta {
            if let Some(sell_tax) = meta.sell_tax {
                if sell_tax > self.thresholds.sell_tax_pct {
                    score += 0.6;
                    hits.push(SignalHit {
                        id: "honeypot_sell_tax",
                        detail: format!("very high sell tax ({:.0}%), possible honeypot", sell_tax),
                    });
                }
            }
            if let Some(buy_tax) = meta.buy_tax {
                if buy_tax > self.thresholds.buy_tax_pct {
                    score += 0.4;
                    hits.push(SignalHit {
                        id: "high_buy_tax",
                        detail: format!("high buy tax ({:.0}%)", buy_tax),
                    });
                }
            }
            if meta.owner_renounced == TriState::No {
                score += 0.3;
                hits.push(SignalHit {
                    id: "owner_not_renounced",
                    detail: "contract ownership has not been renounced".to_string(),
                });
            }
        }

        ContractOutcome {
            score: score.min(1.0),
            hits,
        }
    }
}
