//! Tabular risk model
//!
//! Wraps a pre-trained binary classifier: a serialized tree ensemble paired
//! with its min-max feature transform, loaded together from one JSON artifact.
//! The pair is versioned; a classifier with a mismatched transform is rejected
//! at load time and the model fails closed to the amount-tier heuristic.
//!
//! The variant is selected once at construction:
//! - `Trained` — artifact present and valid
//! - `Heuristic` — no artifact, invalid artifact, or explicit choice
//!
//! At inference time a trained model that errors for any reason degrades to
//! the heuristic for that call and flags the outcome. Predictions are always
//! clamped to [0,1].

use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::{info, warn};

use crate::models::errors::{AppError, AppResult};
use crate::models::types::{EnrichedFacts, Transaction};
use crate::utils::constants::token_volatility;

/// Monotonic amount-tier fallback: (upper bound USD, probability)
const HEURISTIC_TIERS: [(f64, f64); 3] = [(1_000.0, 0.05), (10_000.0, 0.20), (100_000.0, 0.50)];
const HEURISTIC_MAX: f64 = 0.85;

/// One node of a decision tree. `feature < 0` marks a leaf carrying `value`
/// (the class probability at that leaf).
#[derive(Debug, Clone, Deserialize)]
pub struct TreeNode {
    pub feature: i32,
    pub threshold: f64,
    pub left: i32,
    pub right: i32,
    pub value: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Tree {
    pub nodes: Vec<TreeNode>,
}

impl Tree {
    fn predict(&self, x: &[f64]) -> AppResult<f64> {
        let mut idx = 0usize;
        // A well-formed tree terminates long before visiting every node once
        for _ in 0..=self.nodes.len() {
            let node = self
                .nodes
                .get(idx)
                .ok_or_else(|| AppError::model_inference_failed("node index out of range"))?;
            if node.feature < 0 {
                return Ok(node.value);
            }
            let feature = x
                .get(node.feature as usize)
                .ok_or_else(|| AppError::model_inference_failed("feature index out of range"))?;
            let next = if *feature <= node.threshold {
                node.left
            } else {
                node.right
            };
            if next < 0 {
                return Err(AppError::model_inference_failed("negative child index"));
            }
            idx = next as usize;
        }
        Err(AppError::model_inference_failed("tree walk did not terminate"))
    }
}

/// Min-max transform fitted alongside the classifier
#[derive(Debug, Clone, Deserialize)]
pub struct MinMaxScaler {
    pub mins: Vec<f64>,
    pub maxs: Vec<f64>,
}

impl MinMaxScaler {
    fn transform(&self, x: &[f64]) -> AppResult<Vec<f64>> {
        if self.mins.len() != x.len() || self.maxs.len() != x.len() {
            return Err(AppError::model_inference_failed(
                "feature vector does not match scaler dimensions",
            ));
        }
        Ok(x.iter()
            .enumerate()
            .map(|(i, v)| {
                let span = self.maxs[i] - self.mins[i];
                if span > 0.0 {
                    (v - self.mins[i]) / span
                } else {
                    0.0
                }
            })
            .collect())
    }
}

/// Serialized (classifier, feature-transform) pair.
/// Shipping both in one self-describing document is what makes a mismatched
/// pair impossible to load by accident.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelArtifact {
    pub model_version: String,
    pub transform_version: String,
    pub feature_names: Vec<String>,
    pub scaler: MinMaxScaler,
    pub trees: Vec<Tree>,
}

impl ModelArtifact {
    pub fn validate(&self) -> AppResult<()> {
        if self.model_version != self.transform_version {
            return Err(AppError::model_version_mismatch(
                &self.model_version,
                &self.transform_version,
            ));
        }
        if self.feature_names.is_empty() {
            return Err(AppError::new(
                crate::models::errors::ErrorCode::ModelArtifactInvalid,
                "artifact declares no features",
            ));
        }
        if self.scaler.mins.len() != self.feature_names.len()
            || self.scaler.maxs.len() != self.feature_names.len()
        {
            return Err(AppError::new(
                crate::models::errors::ErrorCode::ModelArtifactInvalid,
                "scaler dimensions do not match feature names",
            ));
        }
        if self.trees.is_empty() {
            return Err(AppError::new(
                crate::models::errors::ErrorCode::ModelArtifactInvalid,
                "artifact contains no trees",
            ));
        }
        Ok(())
    }
}

/// A loaded, validated classifier
pub struct TrainedClassifier {
    artifact: ModelArtifact,
}

impl TrainedClassifier {
    pub fn predict(&self, features: &HashMap<String, f64>) -> AppResult<f64> {
        // Order the vector by the artifact's feature list; a feature the
        // builder does not know contributes 0.0
        let vector: Vec<f64> = self
            .artifact
            .feature_names
            .iter()
            .map(|name| features.get(name).copied().unwrap_or(0.0))
            .collect();

        let scaled = self.artifact.scaler.transform(&vector)?;

        let mut sum = 0.0;
        for tree in &self.artifact.trees {
            sum += tree.predict(&scaled)?;
        }
        let prob = sum / self.artifact.trees.len() as f64;
        Ok(prob.clamp(0.0, 1.0))
    }
}

/// Outcome of one prediction, explicit about degradation
#[derive(Debug, Clone)]
pub enum TabularOutcome {
    Scored(f64),
    Degraded { fallback: f64, reason: String },
}

impl TabularOutcome {
    pub fn value(&self) -> f64 {
        match self {
            TabularOutcome::Scored(v) => *v,
            TabularOutcome::Degraded { fallback, .. } => *fallback,
        }
    }
}

/// The tabular component: trained classifier or heuristic, chosen once
pub enum TabularModel {
    Trained(TrainedClassifier),
    Heuristic,
}

impl TabularModel {
    /// Load from an optional artifact path. Any load failure logs and falls
    /// closed to the heuristic — a missing model must never prevent scoring.
    pub fn from_artifact_path(path: Option<&str>) -> Self {
        let path = match path {
            Some(p) => p,
            None => {
                info!("No model artifact configured, using amount-tier heuristic");
                return Self::Heuristic;
            }
        };
        match Self::load(Path::new(path)) {
            Ok(classifier) => {
                info!(
                    "Loaded tabular model artifact v{} ({} trees, {} features)",
                    classifier.artifact.model_version,
                    classifier.artifact.trees.len(),
                    classifier.artifact.feature_names.len()
                );
                Self::Trained(classifier)
            }
            Err(err) => {
                warn!("⚠️ Model artifact rejected ({}), falling back to heuristic", err);
                Self::Heuristic
            }
        }
    }

    fn load(path: &Path) -> AppResult<TrainedClassifier> {
        let raw = std::fs::read_to_string(path)?;
        let artifact: ModelArtifact = serde_json::from_str(&raw).map_err(|e| {
            AppError::with_source(
                crate::models::errors::ErrorCode::ModelArtifactInvalid,
                "artifact is not valid JSON",
                e,
            )
        })?;
        artifact.validate()?;
        Ok(TrainedClassifier { artifact })
    }

    /// Probability of risk in [0,1] for one transaction
    pub fn predict(&self, tx: &Transaction, facts: &EnrichedFacts) -> TabularOutcome {
        match self {
            TabularModel::Heuristic => TabularOutcome::Scored(heuristic_score(tx.amount_usd)),
            TabularModel::Trained(classifier) => {
                let features = build_features(tx, facts);
                match classifier.predict(&features) {
                    Ok(prob) => TabularOutcome::Scored(prob),
                    Err(err) => {
                        warn!("Tabular inference failed: {}", err);
                        TabularOutcome::Degraded {
                            fallback: heuristic_score(tx.amount_usd),
                            reason: err.code_str().to_string(),
                        }
                    }
                }
            }
        }
    }
}

/// Monotonic fallback mapping from amount alone
pub fn heuristic_score(amount_usd: f64) -> f64 {
    for (bound, prob) in HEURISTIC_TIERS {
        if amount_usd <= bound {
            return prob;
        }
    }
    HEURISTIC_MAX
}

/// Inference-side feature builder: everything computable before broadcast.
/// Must stay in sync with the offline training pipeline's feature names;
/// unknown names resolve to 0.0 at prediction time.
pub fn build_features(tx: &Transaction, facts: &EnrichedFacts) -> HashMap<String, f64> {
    let mut features = HashMap::new();
    features.insert("amount_usd".to_string(), tx.amount_usd);
    features.insert("log_amount".to_string(), (tx.amount_usd + 1.0).ln());
    features.insert(
        "token_volatility".to_string(),
        token_volatility(&tx.token_symbol),
    );
    features.insert(
        "from_age_days".to_string(),
        facts.wallet_age_days.unwrap_or(0) as f64,
    );
    features.insert(
        "to_age_days".to_string(),
        facts.recipient_age_days.unwrap_or(0) as f64,
    );
    features.insert(
        "sender_tx_count".to_string(),
        facts.wallet_tx_count.unwrap_or(0) as f64,
    );
    features.insert(
        "recipient_tx_count".to_string(),
        facts.recipient_tx_count.unwrap_or(0) as f64,
    );
    features.insert(
        "is_contract_to".to_string(),
        if tx.token_contract.is_some() { 1.0 } else { 0.0 },
    );
    features.insert(
        "amount_vs_avg".to_string(),
        match facts.sender_avg_tx_usd {
            Some(avg) if avg > 0.0 => tx.amount_usd / avg,
            _ => 0.0,
        },
    );
    features
}
