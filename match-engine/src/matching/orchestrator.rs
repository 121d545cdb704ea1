//! Top-level match coordination.
//!
//! One request flows through resolve → fetch → validate → extract →
//! score → rank. The soft performance target is monitored, never
//! enforced; a separate hard timeout bounds worst-case latency with a
//! retryable error. Coverage gaps and filtered-empty pools are
//! successful responses with a reason code; an empty result is not a
//! failure, and the two kinds of empty are distinguishable.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, warn};

use crate::cache::{CacheStore, ResultCache};
use crate::domain::{DomainError, DriverId, Hub, MatchFilters, MatchRequest};
use crate::geo::Point;
use crate::resolver::HubResolver;
use crate::scoring::{ExplanationTerm, Score, ScoringStrategy};
use crate::stores::{
    CachedDriverStats, DriverStatsProvider, HubStore, RouteStore, StoreError,
};
use crate::telemetry::{MetricsSink, Stage};

use super::candidates::CandidateFetcher;
use super::config::MatchConfig;
use super::features::{FeatureExtractor, FeatureVector};
use super::stops::{self, ValidatedCandidate};

/// Why a successful response carries zero matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoMatchReason {
    /// No active hub near one of the endpoints, even at the widened
    /// radius. Candidate fetch was never attempted.
    NoCoverage,
    /// Hubs resolved but the candidate pool was empty.
    NoAvailability,
    /// Candidates existed but every one failed boardability or the
    /// request's own filters.
    FilteredOut,
}

/// A boarding or alighting stop in the response.
#[derive(Debug, Clone, Serialize)]
pub struct StopSummary {
    pub name: String,
    pub sequence: u32,
    /// Distance from the rider's endpoint to this stop, meters.
    pub distance_m: f64,
}

/// The route-level part of one match.
#[derive(Debug, Clone, Serialize)]
pub struct RouteSummary {
    pub route_id: String,
    pub driver_id: String,
    pub vehicle_id: String,
    pub departure_time: chrono::NaiveTime,
    pub board: StopSummary,
    pub alight: StopSummary,
    pub ride_minutes: u32,
}

/// One ranked match.
#[derive(Debug, Clone, Serialize)]
pub struct MatchResult {
    /// 1-based position in the ranked list.
    pub rank: usize,
    pub route: RouteSummary,
    pub score: f64,
    pub explanation: Vec<ExplanationTerm>,
    pub price: f64,
    pub currency: String,
    pub seats_available: u8,
    pub driver_rating: Option<f32>,
    pub origin_distance_m: f64,
    pub destination_distance_m: f64,
    /// Route departure minus desired departure, minutes, signed.
    pub time_delta_min: i64,
    pub hub_match_quality: f64,
}

/// The engine's answer to one match request.
#[derive(Debug, Clone, Serialize)]
pub struct MatchResponse {
    pub matches: Vec<MatchResult>,
    pub execution_time_ms: u64,
    /// Pool size before hard filtering.
    pub candidates_considered: usize,
    /// Present exactly when `matches` is empty.
    pub reason: Option<NoMatchReason>,
    /// True when any candidate was scored by the heuristic fallback
    /// instead of the configured model.
    pub degraded_scoring: bool,
}

/// Errors surfaced to the caller. Everything a retry could fix says so.
#[derive(Debug, thiserror::Error)]
pub enum MatchError {
    /// The request itself is malformed; no store was contacted.
    #[error(transparent)]
    InvalidRequest(#[from] DomainError),

    /// An upstream store failed after the retry policy was exhausted.
    #[error("upstream store failure: {0}")]
    Store(#[from] StoreError),

    /// The hard request deadline fired.
    #[error("match request exceeded the hard timeout")]
    Timeout,
}

impl MatchError {
    /// Whether the caller may usefully resubmit the same request.
    pub fn is_retryable(&self) -> bool {
        match self {
            MatchError::InvalidRequest(_) => false,
            MatchError::Store(e) => e.is_transient(),
            MatchError::Timeout => true,
        }
    }
}

/// A validated candidate with its features and score, pre-ranking.
struct ScoredCandidate {
    validated: ValidatedCandidate,
    features: FeatureVector,
    rating: Option<f32>,
    score: Score,
}

/// Coordinates the whole pipeline for one request at a time.
///
/// Constructed once per process with already-connected store clients;
/// connection lifecycle belongs to the entry point, not here. All state
/// is shared and immutable, so one orchestrator serves any number of
/// concurrent requests.
pub struct MatchOrchestrator {
    resolver: HubResolver,
    fetcher: CandidateFetcher,
    stats: Arc<dyn DriverStatsProvider>,
    extractor: FeatureExtractor,
    scoring: Arc<dyn ScoringStrategy>,
    metrics: Arc<dyn MetricsSink>,
    config: Arc<MatchConfig>,
}

impl MatchOrchestrator {
    pub fn new(
        hub_store: Arc<dyn HubStore>,
        route_store: Arc<dyn RouteStore>,
        stats: Arc<dyn DriverStatsProvider>,
        cache_store: Arc<dyn CacheStore>,
        scoring: Arc<dyn ScoringStrategy>,
        metrics: Arc<dyn MetricsSink>,
        config: MatchConfig,
    ) -> Self {
        let config = Arc::new(config);
        let cache = ResultCache::new(cache_store, metrics.clone());

        Self {
            resolver: HubResolver::new(
                hub_store,
                cache.clone(),
                config.hub_cache_ttl,
                config.retry_backoff,
            ),
            fetcher: CandidateFetcher::new(route_store, cache.clone(), config.clone()),
            stats: Arc::new(CachedDriverStats::new(stats, cache, config.stats_cache_ttl)),
            extractor: FeatureExtractor::new(config.clone()),
            scoring,
            metrics,
            config,
        }
    }

    /// Find and rank routes for one request.
    pub async fn find_matches(&self, request: &MatchRequest) -> Result<MatchResponse, MatchError> {
        request.validate()?;

        let started = Instant::now();
        match tokio::time::timeout(self.config.hard_timeout, self.run(request, started)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    rider = %request.rider,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "hard timeout aborted match request"
                );
                Err(MatchError::Timeout)
            }
        }
    }

    async fn run(
        &self,
        request: &MatchRequest,
        started: Instant,
    ) -> Result<MatchResponse, MatchError> {
        // Origin and destination resolution are independent; run both
        // lookups concurrently and await them together.
        let stage = Instant::now();
        let (origin_hub, destination_hub) = tokio::join!(
            self.resolve_with_fallback(request.origin),
            self.resolve_with_fallback(request.destination),
        );
        let (origin_hub, destination_hub) = (origin_hub?, destination_hub?);
        self.metrics
            .stage_latency(Stage::ResolvingHubs, stage.elapsed());

        let (Some(origin_hub), Some(destination_hub)) = (origin_hub, destination_hub) else {
            debug!(rider = %request.rider, "no hub coverage for request endpoints");
            return Ok(self.finish(Vec::new(), 0, Some(NoMatchReason::NoCoverage), false, started));
        };
        debug!(
            origin_hub = %origin_hub.id,
            destination_hub = %destination_hub.id,
            "resolved hub pair"
        );

        let stage = Instant::now();
        let candidates = self
            .fetcher
            .fetch(&origin_hub, &destination_hub, request)
            .await?;
        let candidates_considered = candidates.len();
        self.metrics.candidate_pool_size(candidates_considered);
        self.metrics
            .stage_latency(Stage::FetchingCandidates, stage.elapsed());

        if candidates.is_empty() {
            return Ok(self.finish(
                Vec::new(),
                0,
                Some(NoMatchReason::NoAvailability),
                false,
                started,
            ));
        }

        // Hard filters: boardability first, then the request's own
        // constraints. Binary, never a scoring factor.
        let stage = Instant::now();
        let validated: Vec<ValidatedCandidate> = candidates
            .into_iter()
            .filter_map(|c| stops::validate_candidate(c, request, &self.config))
            .filter(|vc| passes_filters(vc, &request.filters))
            .collect();
        self.metrics
            .stage_latency(Stage::ValidatingStops, stage.elapsed());

        if validated.is_empty() {
            return Ok(self.finish(
                Vec::new(),
                candidates_considered,
                Some(NoMatchReason::FilteredOut),
                false,
                started,
            ));
        }

        let stage = Instant::now();
        let ratings = self.fetch_ratings(&validated).await;
        let featured: Vec<(ValidatedCandidate, FeatureVector, Option<f32>)> = validated
            .into_iter()
            .map(|vc| {
                let rating = ratings.get(&vc.candidate.route.driver).copied();
                let features = self.extractor.extract(&vc, rating);
                (vc, features, rating)
            })
            .collect();
        self.metrics
            .stage_latency(Stage::ExtractingFeatures, stage.elapsed());

        // Score all candidates concurrently; order is restored by the
        // deterministic sort below, so completion order is irrelevant.
        let stage = Instant::now();
        let scores = join_all(
            featured
                .iter()
                .map(|(_, features, _)| self.scoring.score(features)),
        )
        .await;
        let degraded = scores.iter().any(|s| s.degraded);
        if degraded {
            self.metrics.scoring_degraded();
        }
        self.metrics.stage_latency(Stage::Scoring, stage.elapsed());

        let stage = Instant::now();
        let mut scored: Vec<ScoredCandidate> = featured
            .into_iter()
            .zip(scores)
            .map(|((validated, features, rating), score)| ScoredCandidate {
                validated,
                features,
                rating,
                score,
            })
            .collect();

        // Score descending, then price ascending, then origin distance
        // ascending; route id last so equal candidates still order
        // identically on every run.
        scored.sort_by(|a, b| {
            b.score
                .value
                .total_cmp(&a.score.value)
                .then_with(|| a.validated.price.total_cmp(&b.validated.price))
                .then_with(|| {
                    a.validated
                        .plan
                        .board_distance_m
                        .total_cmp(&b.validated.plan.board_distance_m)
                })
                .then_with(|| a.validated.candidate.route.id.cmp(&b.validated.candidate.route.id))
        });
        scored.truncate(self.config.result_limit(request.limit));

        let matches: Vec<MatchResult> = scored
            .into_iter()
            .enumerate()
            .map(|(i, sc)| build_result(i + 1, sc))
            .collect();
        self.metrics.stage_latency(Stage::Ranking, stage.elapsed());

        Ok(self.finish(matches, candidates_considered, None, degraded, started))
    }

    /// Resolve the nearest hub, widening once to the fallback radius
    /// before giving up on coverage.
    async fn resolve_with_fallback(&self, point: Point) -> Result<Option<Hub>, StoreError> {
        if let Some(hub) = self
            .resolver
            .nearest(point, self.config.default_hub_radius_m)
            .await?
        {
            return Ok(Some(hub));
        }

        debug!(%point, "no hub at default radius, widening once");
        self.resolver
            .nearest(point, self.config.fallback_hub_radius_m)
            .await
    }

    /// Ratings for every distinct driver in the validated pool, fetched
    /// concurrently. A failed or missing lookup leaves the driver out;
    /// scoring substitutes the neutral rating.
    async fn fetch_ratings(&self, validated: &[ValidatedCandidate]) -> HashMap<DriverId, f32> {
        let mut drivers: Vec<&DriverId> = validated
            .iter()
            .map(|vc| &vc.candidate.route.driver)
            .collect();
        drivers.sort();
        drivers.dedup();

        let lookups = join_all(drivers.iter().map(|driver| async move {
            (*driver, self.stats.stats(driver).await)
        }))
        .await;

        let mut ratings = HashMap::new();
        for (driver, result) in lookups {
            match result {
                Ok(Some(stats)) => {
                    ratings.insert(driver.clone(), stats.rating);
                }
                Ok(None) => {}
                Err(e) => {
                    debug!(driver = %driver, error = %e, "driver stats unavailable, using neutral rating");
                }
            }
        }
        ratings
    }

    /// Assemble the response and emit completion telemetry.
    fn finish(
        &self,
        matches: Vec<MatchResult>,
        candidates_considered: usize,
        reason: Option<NoMatchReason>,
        degraded_scoring: bool,
        started: Instant,
    ) -> MatchResponse {
        let elapsed = started.elapsed();
        if elapsed > self.config.performance_target {
            self.metrics
                .target_violation(elapsed, self.config.performance_target);
        }

        MatchResponse {
            matches,
            execution_time_ms: elapsed.as_millis() as u64,
            candidates_considered,
            reason,
            degraded_scoring,
        }
    }
}

/// The request's optional hard constraints.
fn passes_filters(vc: &ValidatedCandidate, filters: &MatchFilters) -> bool {
    if let Some(max_price) = filters.max_price {
        if vc.price > max_price {
            return false;
        }
    }
    if let Some(min_seats) = filters.min_seats {
        if vc.candidate.route.seats_available < min_seats {
            return false;
        }
    }
    if let Some(max_detour) = filters.max_detour_min {
        if vc.detour_min > max_detour {
            return false;
        }
    }
    true
}

fn build_result(rank: usize, sc: ScoredCandidate) -> MatchResult {
    let ScoredCandidate {
        validated,
        features,
        rating,
        score,
    } = sc;
    let route = validated.candidate.route.clone();
    let plan = validated.plan;
    let board_stop = &route.stops[plan.board_idx];
    let alight_stop = &route.stops[plan.alight_idx];

    MatchResult {
        rank,
        route: RouteSummary {
            route_id: route.id.to_string(),
            driver_id: route.driver.to_string(),
            vehicle_id: route.vehicle.to_string(),
            departure_time: route.departure_time,
            board: StopSummary {
                name: board_stop.name.clone(),
                sequence: board_stop.sequence,
                distance_m: plan.board_distance_m,
            },
            alight: StopSummary {
                name: alight_stop.name.clone(),
                sequence: alight_stop.sequence,
                distance_m: plan.alight_distance_m,
            },
            ride_minutes: validated.ride_minutes,
        },
        score: score.value,
        explanation: score.explanation,
        price: validated.price,
        currency: route.currency.clone(),
        seats_available: route.seats_available,
        driver_rating: rating,
        origin_distance_m: validated.candidate.origin_distance_m,
        destination_distance_m: validated.candidate.destination_distance_m,
        time_delta_min: validated.candidate.time_delta_min,
        hub_match_quality: features.hub_match_quality(),
    }
}
