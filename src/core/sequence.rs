//! Sequence anomaly model
//!
//! Statistical deviation of the current amount against the sender's
//! historical amount distribution. Kept deliberately simple: a z-score over
//! the population standard deviation, mapped linearly so that five standard
//! deviations saturate at maximum risk.

/// Score returned when there is not enough history to compare against.
/// Insufficient data is not evidence of risk.
pub const NEUTRAL_SCORE: f64 = 0.10;

/// Minimum history length for a meaningful comparison
const MIN_HISTORY: usize = 3;

/// Standard-deviation floor to avoid division by zero on flat histories
const STD_EPSILON: f64 = 1e-6;

/// Z-score at which risk saturates to 1.0
const SATURATION_Z: f64 = 5.0;

pub struct SequenceModel;

impl SequenceModel {
    pub fn new() -> Self {
        Self
    }

    /// Risk in [0,1] for `current` given the sender's past amounts
    pub fn score(&self, history: &[f64], current: f64) -> f64 {
        if history.len() < MIN_HISTORY {
            return NEUTRAL_SCORE;
        }

        let n = history.len() as f64;
        let mean = history.iter().sum::<f64>() / n;
        let variance = history.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
        let std = variance.sqrt().max(STD_EPSILON);

        let z = (current - mean).abs() / std;
        (z / SATURATION_Z).min(1.0)
    }
}

impl Default for SequenceModel {
    fn default() -> Self {
        Self::new()
    }
}
