//! Route-matching engine for a hub-based rideshare platform.
//!
//! Answers: "given where I am, where I'm going and when, which driver
//! routes can take me?" A geospatial filter-then-rank pipeline over
//! externally owned hub, route and driver data, with TTL caching and a
//! pluggable scoring strategy.

pub mod cache;
pub mod domain;
pub mod geo;
pub mod matching;
pub mod resolver;
pub mod scoring;
pub mod stores;
pub mod telemetry;
