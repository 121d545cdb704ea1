//! Demo entry point: wires the engine against in-memory stores with
//! sample Lagos data and runs one match request end-to-end.
//!
//! In production the same orchestrator is constructed with the HTTP
//! store clients and handed to the platform's API layer; this binary
//! exists to exercise the pipeline without any of that.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};

use match_engine::cache::{MokaStore, MokaStoreConfig};
use match_engine::domain::{
    DriverId, Hub, HubId, MatchFilters, MatchRequest, RiderId, Route, RouteId, RouteStatus,
    RouteStop, VehicleId, WeekdaySet,
};
use match_engine::geo::Point;
use match_engine::matching::{MatchConfig, MatchOrchestrator};
use match_engine::scoring::HeuristicScoring;
use match_engine::stores::mock::{InMemoryHubStore, InMemoryRouteStore, StaticDriverStats};
use match_engine::stores::DriverStats;
use match_engine::telemetry::TracingSink;

fn hub(id: &str, name: &str, area: &str, lat: f64, lon: f64) -> Hub {
    Hub {
        id: HubId::parse(id).expect("valid hub id"),
        name: name.to_string(),
        location: Point::new(lat, lon).expect("valid coordinate"),
        area: area.to_string(),
        active: true,
    }
}

fn stop(seq: u32, name: &str, lat: f64, lon: f64, offset: u32, price: f64) -> RouteStop {
    RouteStop {
        sequence: seq,
        name: name.to_string(),
        location: Point::new(lat, lon).expect("valid coordinate"),
        arrival_offset_min: offset,
        price_from_origin: price,
    }
}

fn sample_hubs() -> Vec<Hub> {
    vec![
        hub("hub-yaba", "Yaba Bus Terminal", "Yaba", 6.5250, 3.3795),
        hub("hub-vi", "Victoria Island Gate", "Eti-Osa", 6.4285, 3.4215),
        hub("hub-ikeja", "Ikeja City Mall", "Ikeja", 6.6018, 3.3515),
    ]
}

fn sample_routes() -> Vec<Route> {
    let morning_express = Route {
        id: RouteId::parse("route-yaba-vi-0720").expect("valid route id"),
        driver: DriverId::parse("driver-ade").expect("valid driver id"),
        vehicle: VehicleId::parse("vehicle-kja-104").expect("valid vehicle id"),
        stops: vec![
            stop(0, "Herbert Macaulay Way", 6.5246, 3.3790, 0, 0.0),
            stop(1, "Third Mainland Bridge", 6.4900, 3.3900, 15, 400.0),
            stop(2, "Osborne Road", 6.4600, 3.4100, 30, 800.0),
            stop(3, "Ahmadu Bello Way", 6.4283, 3.4217, 45, 1_200.0),
        ],
        departure_time: NaiveTime::from_hms_opt(7, 20, 0).expect("valid time"),
        weekdays: WeekdaySet::weekdays(),
        seats_total: 4,
        seats_available: 3,
        base_price: 1_200.0,
        currency: "NGN".to_string(),
        status: RouteStatus::Active,
        origin_hub: Some(HubId::parse("hub-yaba").expect("valid hub id")),
        destination_hub: Some(HubId::parse("hub-vi").expect("valid hub id")),
    };

    // Published before hub associations existed; matches via geometry.
    let legacy = Route {
        id: RouteId::parse("route-legacy-0645").expect("valid route id"),
        driver: DriverId::parse("driver-bisi").expect("valid driver id"),
        vehicle: VehicleId::parse("vehicle-lnd-771").expect("valid vehicle id"),
        stops: vec![
            stop(0, "Tejuosho Market", 6.5230, 3.3780, 0, 0.0),
            stop(1, "Obalende", 6.4450, 3.4080, 35, 700.0),
            stop(2, "Eko Hotel Roundabout", 6.4290, 3.4220, 50, 1_000.0),
        ],
        departure_time: NaiveTime::from_hms_opt(6, 45, 0).expect("valid time"),
        weekdays: WeekdaySet::every_day(),
        seats_total: 3,
        seats_available: 1,
        base_price: 1_000.0,
        currency: "NGN".to_string(),
        status: RouteStatus::Active,
        origin_hub: None,
        destination_hub: None,
    };

    vec![morning_express, legacy]
}

fn sample_stats() -> StaticDriverStats {
    StaticDriverStats::new(HashMap::from([
        (
            DriverId::parse("driver-ade").expect("valid driver id"),
            DriverStats {
                rating: 4.7,
                completed_trips: 412,
            },
        ),
        (
            DriverId::parse("driver-bisi").expect("valid driver id"),
            DriverStats {
                rating: 4.1,
                completed_trips: 87,
            },
        ),
    ]))
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let orchestrator = MatchOrchestrator::new(
        Arc::new(InMemoryHubStore::new(sample_hubs())),
        Arc::new(InMemoryRouteStore::new(sample_routes())),
        Arc::new(sample_stats()),
        Arc::new(MokaStore::new(&MokaStoreConfig::default())),
        Arc::new(HeuristicScoring::default()),
        Arc::new(TracingSink),
        MatchConfig::default(),
    );

    // Monday 07:00, Yaba to Victoria Island.
    let request = MatchRequest {
        rider: RiderId::parse("rider-demo").expect("valid rider id"),
        origin: Point::new(6.5244, 3.3792).expect("valid coordinate"),
        destination: Point::new(6.4281, 3.4219).expect("valid coordinate"),
        departure: NaiveDate::from_ymd_opt(2026, 3, 2)
            .expect("valid date")
            .and_hms_opt(7, 0, 0)
            .expect("valid time"),
        filters: MatchFilters::default(),
        limit: None,
    };

    println!(
        "Matching {} -> {} at {}",
        request.origin, request.destination, request.departure
    );
    println!();

    match orchestrator.find_matches(&request).await {
        Ok(response) => {
            println!(
                "{} match(es) from {} candidate(s) in {} ms",
                response.matches.len(),
                response.candidates_considered,
                response.execution_time_ms
            );
            if let Some(reason) = response.reason {
                println!("No matches: {reason:?}");
            }
            for m in &response.matches {
                println!();
                println!(
                    "#{} {} (driver {}, score {:.3})",
                    m.rank, m.route.route_id, m.route.driver_id, m.score
                );
                println!(
                    "   board {} (stop {}, {:.0} m away), alight {} (stop {})",
                    m.route.board.name,
                    m.route.board.sequence,
                    m.route.board.distance_m,
                    m.route.alight.name,
                    m.route.alight.sequence
                );
                println!(
                    "   departs {} ({:+} min), {} min ride, {:.0} {}, {} seat(s), rating {}",
                    m.route.departure_time,
                    m.time_delta_min,
                    m.route.ride_minutes,
                    m.price,
                    m.currency,
                    m.seats_available,
                    m.driver_rating
                        .map_or("n/a".to_string(), |r| format!("{r:.1}")),
                );
                for term in &m.explanation {
                    println!(
                        "     {:>22}: {:.2} x {:.2} = {:.3}",
                        term.feature, term.weight, term.value, term.contribution
                    );
                }
            }
        }
        Err(e) => {
            eprintln!("match failed: {e} (retryable: {})", e.is_retryable());
            std::process::exit(1);
        }
    }
}
