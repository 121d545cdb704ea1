//! Engine configuration.
//!
//! Every tolerance the pipeline uses is a named field with a stated
//! default, not a constant buried in a service. Defaults are starting
//! points; production values want empirical tuning.

use std::time::Duration;

/// Configuration for the match pipeline.
#[derive(Debug, Clone)]
pub struct MatchConfig {
    /// Radius for the first hub-resolution attempt, meters.
    pub default_hub_radius_m: f64,

    /// Radius for the single widening retry when the default radius
    /// finds nothing.
    pub fallback_hub_radius_m: f64,

    /// Per-stop matching radius for boardability, meters. Also the
    /// normalization constant for the stop-distance features, so scores
    /// stay comparable across requests.
    pub stop_radius_m: f64,

    /// Radius for the geometry-fallback route query, meters.
    pub geometry_fallback_radius_m: f64,

    /// Departure-time tolerance either side of the desired time, minutes.
    pub time_tolerance_min: i64,

    /// Bucket size for time-keyed candidate caching, minutes.
    pub time_bucket_min: u32,

    /// Result count when the request doesn't ask for one.
    pub max_results_default: usize,

    /// Hard cap on result count, whatever the request asks for.
    pub max_results_cap: usize,

    /// TTL for hub-resolution cache entries. Hubs rarely move.
    pub hub_cache_ttl: Duration,

    /// TTL for candidate route sets. Seat counts change frequently.
    pub candidate_cache_ttl: Duration,

    /// TTL for driver aggregate stats.
    pub stats_cache_ttl: Duration,

    /// Soft latency target. Exceeding it emits a violation signal but
    /// never aborts the request.
    pub performance_target: Duration,

    /// Hard deadline for the whole request. Exceeding it aborts with a
    /// retryable error. Must stay above the store client timeouts so
    /// inner deadlines fire first and the pipeline can degrade.
    pub hard_timeout: Duration,

    /// Backoff before the single retry of a transient store error.
    pub retry_backoff: Duration,

    /// Assumed average urban speed for the straight-line ride estimate
    /// behind the detour filter, km/h.
    pub avg_speed_kmh: f64,

    /// Price normalization ceiling for the price feature.
    pub price_ceiling: f64,

    /// Rating substituted for drivers with no history, 0-5 scale.
    pub neutral_rating: f32,
}

impl MatchConfig {
    pub fn time_tolerance(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.time_tolerance_min)
    }

    /// Bucket index for a time of day, used in candidate cache keys.
    pub fn time_bucket(&self, t: chrono::NaiveTime) -> u32 {
        use chrono::Timelike;
        (t.hour() * 60 + t.minute()) / self.time_bucket_min
    }

    /// Clamp a requested result count to the configured bounds.
    pub fn result_limit(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.max_results_default)
            .min(self.max_results_cap)
    }
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            default_hub_radius_m: 3_000.0,
            fallback_hub_radius_m: 6_000.0,
            stop_radius_m: 500.0,
            geometry_fallback_radius_m: 1_000.0,
            time_tolerance_min: 60,
            time_bucket_min: 10,
            max_results_default: 20,
            max_results_cap: 50,
            hub_cache_ttl: Duration::from_secs(300),
            candidate_cache_ttl: Duration::from_secs(30),
            stats_cache_ttl: Duration::from_secs(300),
            performance_target: Duration::from_millis(500),
            hard_timeout: Duration::from_millis(1_500),
            retry_backoff: Duration::from_millis(100),
            avg_speed_kmh: 25.0,
            price_ceiling: 5_000.0,
            neutral_rating: 3.5,
        }
    }
}
