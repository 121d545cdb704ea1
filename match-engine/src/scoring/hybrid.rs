//! Hybrid scoring: a configured blend of model and heuristic.
//!
//! Smooths model volatility and degrades gracefully: when the model
//! is unavailable the blend collapses to the heuristic alone, flagged
//! as degraded.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use crate::matching::FeatureVector;

use super::heuristic::HeuristicScoring;
use super::model::{ModelClient, ModelScoring};
use super::{ExplanationTerm, Score, ScoringStrategy};

/// The hybrid strategy.
pub struct HybridScoring {
    model: ModelScoring,
    /// Share of the final score taken from the model, in [0, 1].
    model_weight: f64,
}

impl HybridScoring {
    /// Build a hybrid with the given model share (clamped into [0, 1]).
    /// `0.5` is the production default mix.
    pub fn new(client: Arc<dyn ModelClient>, heuristic: HeuristicScoring, model_weight: f64) -> Self {
        Self {
            model: ModelScoring::new(client, heuristic),
            model_weight: model_weight.clamp(0.0, 1.0),
        }
    }

    pub fn with_model_timeout(mut self, timeout: Duration) -> Self {
        self.model = self.model.with_timeout(timeout);
        self
    }
}

#[async_trait]
impl ScoringStrategy for HybridScoring {
    fn name(&self) -> &'static str {
        "hybrid"
    }

    async fn score(&self, features: &FeatureVector) -> Score {
        let heuristic = self.model.fallback().score_sync(features);

        match self.model.try_model(features).await {
            Ok(model_value) => {
                let value = self.model_weight * model_value
                    + (1.0 - self.model_weight) * heuristic.value;

                // Heuristic terms scaled by their share of the blend,
                // plus one term for the model's share.
                let mut explanation: Vec<ExplanationTerm> = heuristic
                    .explanation
                    .into_iter()
                    .map(|t| ExplanationTerm {
                        weight: t.weight * (1.0 - self.model_weight),
                        contribution: t.contribution * (1.0 - self.model_weight),
                        ..t
                    })
                    .collect();
                explanation.push(ExplanationTerm {
                    feature: "model_score",
                    weight: self.model_weight,
                    value: model_value,
                    contribution: self.model_weight * model_value,
                });

                Score {
                    value: value.clamp(0.0, 1.0),
                    explanation,
                    degraded: false,
                }
            }
            Err(e) => {
                warn!(error = %e, "scoring model unavailable, hybrid degrading to heuristic");
                Score {
                    degraded: true,
                    ..heuristic
                }
            }
        }
    }
}
