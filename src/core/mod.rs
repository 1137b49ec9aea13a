//! Scoring sub-models: the five independent signals of the ensemble

pub mod contract;
pub mod graph;
pub mod rules;
pub mod sequence;
pub mod tabular;

/// One fired signal: stable id (keys the impact table) plus human detail
#[derive(Debug, Clone)]
pub struct SignalHit {
    pub id: &'static str,
    pub detail: String,
}

pub use contract::ContractRiskModel;
pub use graph::{Cluster, GraphReputationModel};
pub use rules::{RuleEngine, RuleOutcome};
pub use sequence::SequenceModel;
pub use tabular::{TabularModel, TabularOutcome};
