//! Heuristic scoring: a fixed weighted linear combination.
//!
//! Interpretable, deterministic, and free of any training-data
//! dependency. Because every feature is in [0, 1] and the weights sum
//! to 1, the score is guaranteed to land in [0, 1].

use async_trait::async_trait;

use crate::matching::{FEATURE_COUNT, FEATURE_NAMES, FeatureVector};

use super::{ExplanationTerm, Score, ScoringStrategy};

/// Tolerance for the weights-sum-to-one check.
const WEIGHT_SUM_EPSILON: f64 = 1e-6;

/// Error returned for an invalid weight configuration.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("invalid heuristic weights: {reason}")]
pub struct InvalidWeights {
    reason: &'static str,
}

/// Per-feature weights, validated to be non-negative and sum to 1.0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeuristicWeights {
    values: [f64; FEATURE_COUNT],
}

impl HeuristicWeights {
    /// Validate and wrap a weight vector, in feature order.
    pub fn new(values: [f64; FEATURE_COUNT]) -> Result<Self, InvalidWeights> {
        if values.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(InvalidWeights {
                reason: "weights must be non-negative and finite",
            });
        }
        let sum: f64 = values.iter().sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_EPSILON {
            return Err(InvalidWeights {
                reason: "weights must sum to 1.0",
            });
        }
        Ok(Self { values })
    }

    pub fn values(&self) -> &[f64; FEATURE_COUNT] {
        &self.values
    }
}

impl Default for HeuristicWeights {
    /// Production defaults: proximity dominates, the rest share the
    /// remainder evenly enough to break ties usefully.
    fn default() -> Self {
        Self {
            values: [0.20, 0.20, 0.15, 0.15, 0.10, 0.10, 0.10],
        }
    }
}

/// The heuristic strategy.
#[derive(Debug, Clone, Default)]
pub struct HeuristicScoring {
    weights: HeuristicWeights,
}

impl HeuristicScoring {
    pub fn new(weights: HeuristicWeights) -> Self {
        Self { weights }
    }

    /// Synchronous scoring core, shared with the strategies that use
    /// the heuristic as a fallback.
    pub(super) fn score_sync(&self, features: &FeatureVector) -> Score {
        let mut value = 0.0;
        let mut explanation = Vec::with_capacity(FEATURE_COUNT);

        for i in 0..FEATURE_COUNT {
            let weight = self.weights.values[i];
            let feature_value = features.values()[i];
            let contribution = weight * feature_value;
            value += contribution;
            explanation.push(ExplanationTerm {
                feature: FEATURE_NAMES[i],
                weight,
                value: feature_value,
                contribution,
            });
        }

        Score {
            value: value.clamp(0.0, 1.0),
            explanation,
            degraded: false,
        }
    }
}

#[async_trait]
impl ScoringStrategy for HeuristicScoring {
    fn name(&self) -> &'static str {
        "heuristic"
    }

    async fn score(&self, features: &FeatureVector) -> Score {
        self.score_sync(features)
    }
}
