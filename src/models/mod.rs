//! Data model: core types and the crate-wide error taxonomy

pub mod errors;
pub mod types;

pub use errors::{AppError, AppResult, ErrorCode};
pub use types::{
    Action, Chain, Component, ComponentScores, EnrichedFacts, RiskLabel, TokenMeta, TopFeature,
    Transaction, TriState, TxRecord, Verdict,
};
