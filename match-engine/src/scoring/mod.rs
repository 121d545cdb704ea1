//! Candidate scoring strategies.
//!
//! One contract, a small closed set of implementations: a weighted
//! heuristic, an external learned model, and a hybrid blend. The
//! orchestrator holds an `Arc<dyn ScoringStrategy>` chosen by
//! deployment configuration and never branches on which one it got.

use async_trait::async_trait;
use serde::Serialize;

use crate::matching::FeatureVector;

mod heuristic;
mod hybrid;
mod model;

pub use heuristic::{HeuristicScoring, HeuristicWeights, InvalidWeights};
pub use hybrid::HybridScoring;
pub use model::{HttpModelClient, ModelClient, ModelScoring};

/// One feature's contribution to a score, for "why this route"
/// transparency in the response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExplanationTerm {
    pub feature: &'static str,
    pub weight: f64,
    pub value: f64,
    pub contribution: f64,
}

/// A scored candidate: the scalar, its breakdown, and whether the
/// strategy had to fall back from the model to the heuristic.
#[derive(Debug, Clone, PartialEq)]
pub struct Score {
    /// In [0, 1]; higher ranks first.
    pub value: f64,
    pub explanation: Vec<ExplanationTerm>,
    pub degraded: bool,
}

/// A ranking score for a feature vector.
///
/// Implementations must always produce a score: a strategy with an
/// external dependency degrades internally rather than erroring, so a
/// scoring problem can never fail a match request.
#[async_trait]
pub trait ScoringStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    async fn score(&self, features: &FeatureVector) -> Score;
}
