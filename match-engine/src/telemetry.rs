//! Observability signals emitted by the engine.
//!
//! The engine reports cache effectiveness, per-stage latency, candidate
//! pool sizes and performance-target violations through a [`MetricsSink`]
//! injected at construction. The default sink forwards everything to
//! `tracing`; deployments with a metrics pipeline implement the trait
//! against their own collector. Violating the performance target is a
//! signal, never an abort.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tracing::{debug, info, warn};

/// Pipeline stage labels used for latency reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    ResolvingHubs,
    FetchingCandidates,
    ValidatingStops,
    ExtractingFeatures,
    Scoring,
    Ranking,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::ResolvingHubs => "resolving_hubs",
            Stage::FetchingCandidates => "fetching_candidates",
            Stage::ValidatingStops => "validating_stops",
            Stage::ExtractingFeatures => "extracting_features",
            Stage::Scoring => "scoring",
            Stage::Ranking => "ranking",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sink for structured engine events.
///
/// Implementations must be cheap and non-blocking; they are called on
/// the request path.
pub trait MetricsSink: Send + Sync {
    /// A named cache answered a lookup.
    fn cache_hit(&self, cache: &'static str);
    /// A named cache missed (or the backend was unavailable).
    fn cache_miss(&self, cache: &'static str);
    /// One pipeline stage finished.
    fn stage_latency(&self, stage: Stage, elapsed: Duration);
    /// Size of the candidate pool before hard filtering.
    fn candidate_pool_size(&self, size: usize);
    /// The request finished over the soft performance target.
    fn target_violation(&self, elapsed: Duration, target: Duration);
    /// Scoring fell back from the model to the heuristic.
    fn scoring_degraded(&self);
}

/// Sink that forwards every event to `tracing`.
#[derive(Debug, Default, Clone)]
pub struct TracingSink;

impl MetricsSink for TracingSink {
    fn cache_hit(&self, cache: &'static str) {
        debug!(cache, "cache hit");
    }

    fn cache_miss(&self, cache: &'static str) {
        debug!(cache, "cache miss");
    }

    fn stage_latency(&self, stage: Stage, elapsed: Duration) {
        debug!(stage = stage.as_str(), elapsed_ms = elapsed.as_millis() as u64, "stage complete");
    }

    fn candidate_pool_size(&self, size: usize) {
        debug!(size, "candidate pool fetched");
    }

    fn target_violation(&self, elapsed: Duration, target: Duration) {
        warn!(
            elapsed_ms = elapsed.as_millis() as u64,
            target_ms = target.as_millis() as u64,
            "match request exceeded performance target"
        );
    }

    fn scoring_degraded(&self) {
        info!("scoring degraded to heuristic");
    }
}

/// Sink that drops everything. For tests and tools that don't care.
#[derive(Debug, Default, Clone)]
pub struct NullSink;

impl MetricsSink for NullSink {
    fn cache_hit(&self, _cache: &'static str) {}
    fn cache_miss(&self, _cache: &'static str) {}
    fn stage_latency(&self, _stage: Stage, _elapsed: Duration) {}
    fn candidate_pool_size(&self, _size: usize) {}
    fn target_violation(&self, _elapsed: Duration, _target: Duration) {}
    fn scoring_degraded(&self) {}
}

/// Sink that counts events, for assertions in tests and smoke tooling.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub cache_hits: AtomicU64,
    pub cache_misses: AtomicU64,
    pub stages: AtomicU64,
    pub pool_sizes: AtomicU64,
    pub target_violations: AtomicU64,
    pub degraded: AtomicU64,
}

impl MetricsSink for RecordingSink {
    fn cache_hit(&self, _cache: &'static str) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    fn cache_miss(&self, _cache: &'static str) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    fn stage_latency(&self, _stage: Stage, _elapsed: Duration) {
        self.stages.fetch_add(1, Ordering::Relaxed);
    }

    fn candidate_pool_size(&self, _size: usize) {
        self.pool_sizes.fetch_add(1, Ordering::Relaxed);
    }

    fn target_violation(&self, _elapsed: Duration, _target: Duration) {
        self.target_violations.fetch_add(1, Ordering::Relaxed);
    }

    fn scoring_degraded(&self) {
        self.degraded.fetch_add(1, Ordering::Relaxed);
    }
}
