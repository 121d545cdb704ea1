//! The match pipeline: candidate retrieval, hard filtering, feature
//! extraction, and orchestration.
//!
//! Control flow for one request: resolve hubs → fetch candidates →
//! validate stop sequences → extract features → score → rank. The
//! orchestrator owns the sequencing and the latency budget; each stage
//! lives in its own module.

pub mod candidates;
mod config;
mod features;
mod orchestrator;
pub mod stops;


pub use candidates::{Candidate, CandidateFetcher, HubMatch};
pub use config::MatchConfig;
pub use features::{FEATURE_COUNT, FEATURE_NAMES, FeatureExtractor, FeatureVector};
pub use orchestrator::{
    MatchError, MatchOrchestrator, MatchResponse, MatchResult, NoMatchReason, RouteSummary,
    StopSummary,
};
pub use stops::{BoardingPlan, ValidatedCandidate};
