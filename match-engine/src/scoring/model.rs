//! Model-based scoring against an external scoring service.
//!
//! The model call carries its own bounded timeout and always degrades
//! to the heuristic on failure: a scoring-model outage slows ranking
//! quality, never availability. Degradations are logged and flagged on
//! the returned score so the orchestrator can emit telemetry.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::matching::FeatureVector;
use crate::stores::{StoreClientConfig, StoreError};

use super::heuristic::HeuristicScoring;
use super::{ExplanationTerm, Score, ScoringStrategy};

/// Default deadline for one model call.
const DEFAULT_MODEL_TIMEOUT: Duration = Duration::from_millis(200);

/// Client for the external scoring model service.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Score a feature vector; the service returns a scalar in [0, 1].
    async fn score(&self, features: &FeatureVector) -> Result<f64, StoreError>;
}

#[derive(Serialize)]
struct ScoreRequest<'a> {
    features: &'a [f64],
}

#[derive(Deserialize)]
struct ScoreResponse {
    score: f64,
}

/// HTTP client for the scoring model service.
#[derive(Debug, Clone)]
pub struct HttpModelClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpModelClient {
    pub fn new(config: StoreClientConfig) -> Result<Self, StoreError> {
        Ok(Self {
            http: config.build_client()?,
            base_url: config.base_url,
        })
    }
}

#[async_trait]
impl ModelClient for HttpModelClient {
    async fn score(&self, features: &FeatureVector) -> Result<f64, StoreError> {
        let url = format!("{}/score", self.base_url);
        let response = self
            .http
            .post(&url)
            .json(&ScoreRequest {
                features: features.values(),
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body: ScoreResponse = response.json().await.map_err(|e| StoreError::Json {
            message: e.to_string(),
        })?;

        Ok(body.score)
    }
}

/// The model-based strategy: external model with heuristic fallback.
pub struct ModelScoring {
    client: Arc<dyn ModelClient>,
    fallback: HeuristicScoring,
    timeout: Duration,
}

impl ModelScoring {
    pub fn new(client: Arc<dyn ModelClient>, fallback: HeuristicScoring) -> Self {
        Self {
            client,
            fallback,
            timeout: DEFAULT_MODEL_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// One bounded model call, errors and deadline folded together.
    pub(super) async fn try_model(&self, features: &FeatureVector) -> Result<f64, StoreError> {
        match tokio::time::timeout(self.timeout, self.client.score(features)).await {
            Ok(Ok(raw)) if raw.is_finite() => Ok(raw.clamp(0.0, 1.0)),
            Ok(Ok(_)) => Err(StoreError::Json {
                message: "model returned a non-finite score".to_string(),
            }),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(StoreError::Timeout {
                what: "scoring model call",
            }),
        }
    }

    pub(super) fn fallback(&self) -> &HeuristicScoring {
        &self.fallback
    }
}

#[async_trait]
impl ScoringStrategy for ModelScoring {
    fn name(&self) -> &'static str {
        "model"
    }

    async fn score(&self, features: &FeatureVector) -> Score {
        match self.try_model(features).await {
            Ok(value) => Score {
                value,
                // A learned model has no per-feature breakdown to
                // expose; the single term keeps the response shape.
                explanation: vec![ExplanationTerm {
                    feature: "model_score",
                    weight: 1.0,
                    value,
                    contribution: value,
                }],
                degraded: false,
            },
            Err(e) => {
                warn!(error = %e, "scoring model unavailable, degrading to heuristic");
                let mut score = self.fallback.score_sync(features);
                score.degraded = true;
                score
            }
        }
    }
}

#[cfg(test)]
pub(super) mod test_support {
    use super::*;

    /// Model client with scripted behaviour for strategy tests.
    pub enum ScriptedModel {
        Fixed(f64),
        Fails,
        Hangs,
    }

    #[async_trait]
    impl ModelClient for ScriptedModel {
        async fn score(&self, _features: &FeatureVector) -> Result<f64, StoreError> {
            match self {
                ScriptedModel::Fixed(v) => Ok(*v),
                ScriptedModel::Fails => Err(StoreError::Api {
                    status: 500,
                    message: "model exploded".to_string(),
                }),
                ScriptedModel::Hangs => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    unreachable!("sleep outlives every test timeout")
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::ScriptedModel;
    use super::*;

    fn features() -> FeatureVector {
        FeatureVector::new([0.9, 0.8, 1.0, 0.7, 0.5, 0.7, 1.0])
    }

    #[tokio::test]
    async fn model_score_is_used_when_available() {
        let scoring = ModelScoring::new(
            Arc::new(ScriptedModel::Fixed(0.83)),
            HeuristicScoring::default(),
        );

        let score = scoring.score(&features()).await;
        assert_eq!(score.value, 0.83);
        assert!(!score.degraded);
        assert_eq!(score.explanation.len(), 1);
        assert_eq!(score.explanation[0].feature, "model_score");
    }

    #[tokio::test]
    async fn out_of_range_model_output_is_clamped() {
        let scoring = ModelScoring::new(
            Arc::new(ScriptedModel::Fixed(7.5)),
            HeuristicScoring::default(),
        );

        let score = scoring.score(&features()).await;
        assert_eq!(score.value, 1.0);
    }

    #[tokio::test]
    async fn model_error_degrades_to_heuristic() {
        let scoring = ModelScoring::new(
            Arc::new(ScriptedModel::Fails),
            HeuristicScoring::default(),
        );

        let score = scoring.score(&features()).await;
        assert!(score.degraded);
        // The fallback is the full heuristic, with its explanation.
        let expected = HeuristicScoring::default().score_sync(&features());
        assert_eq!(score.value, expected.value);
        assert_eq!(score.explanation, expected.explanation);
    }

    #[tokio::test(start_paused = true)]
    async fn model_timeout_degrades_to_heuristic() {
        let scoring = ModelScoring::new(
            Arc::new(ScriptedModel::Hangs),
            HeuristicScoring::default(),
        )
        .with_timeout(Duration::from_millis(50));

        let score = scoring.score(&features()).await;
        assert!(score.degraded);
        assert!((0.0..=1.0).contains(&score.value));
    }

    #[tokio::test]
    async fn non_finite_model_output_degrades() {
        let scoring = ModelScoring::new(
            Arc::new(ScriptedModel::Fixed(f64::NAN)),
            HeuristicScoring::default(),
        );

        let score = scoring.score(&features()).await;
        assert!(score.degraded);
    }
}
