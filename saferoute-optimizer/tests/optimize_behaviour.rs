//! End-to-end behaviour of route assembly against stubbed providers.

use std::sync::Arc;

use camino::Utf8PathBuf;
use saferoute_core::{Coordinate, CrimeDistrictRecord, Priority, Station, StationIndex, Stop};
use saferoute_maps::MapsOrchestrator;
use saferoute_maps::test_support::{StubRoutingProvider, candidate_between};
use saferoute_optimizer::{Objective, OptimizeRequest, RouteOptimizer};
use saferoute_scorer::{CrimeRiskCache, ModelPaths, SafetyScorer, SafetyScorerConfig};

fn coord(lat: f64, lng: f64) -> Coordinate {
    Coordinate::new(lat, lng).expect("valid coordinate")
}

fn chennai_scorer(base: &Utf8PathBuf) -> Arc<SafetyScorer> {
    let districts = vec![
        CrimeDistrictRecord::new("central", coord(13.0820, 80.2710), 1_800.0, 120, 60.0)
            .expect("valid district"),
        CrimeDistrictRecord::new("guindy", coord(13.0100, 80.2200), 1_500.0, 45, 35.0)
            .expect("valid district"),
    ];
    let stations = vec![Station {
        name: "Guindy".to_owned(),
        coordinate: coord(13.0069, 80.2206),
    }];
    Arc::new(SafetyScorer::new(
        Arc::new(CrimeRiskCache::new(districts)),
        Arc::new(StationIndex::build(stations)),
        SafetyScorerConfig::new(ModelPaths {
            model: base.join("model.bin"),
            scaler: base.join("scaler.bin"),
        }),
    ))
}

#[tokio::test]
async fn one_reachable_provider_yields_a_complete_route() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let base = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 temp path");

    let origin = coord(13.0827, 80.2707);
    let destination = coord(13.0067, 80.2206);
    let candidates = vec![
        candidate_between("stub", 0, origin, destination, 9_600.0, 1_260.0),
        candidate_between("stub", 1, origin, destination, 11_200.0, 1_500.0),
    ];
    let down = Arc::new(StubRoutingProvider::with_directions_error(
        "down",
        saferoute_core::ProviderError::Unavailable {
            provider: "down".to_owned(),
            message: "connection refused".to_owned(),
        },
    ));
    let up = Arc::new(StubRoutingProvider::with_candidates("stub", candidates));
    let maps = Arc::new(MapsOrchestrator::new(vec![down, up]));
    let optimizer = RouteOptimizer::new(maps, chennai_scorer(&base));

    let request = OptimizeRequest {
        start: Stop::new("start", origin, "Chennai Central", Priority::Normal)
            .expect("valid stop"),
        stops: vec![
            Stop::new("s1", destination, "Guindy", Priority::High).expect("valid stop"),
        ],
        objectives: vec![Objective::Time, Objective::Safety],
        rider: None,
        departure_time: None,
    };

    let route = optimizer
        .optimize_route(&request)
        .await
        .expect("route assembles despite the dead provider");

    assert!(route.total_distance_meters > 0.0);
    assert!(route.total_duration_seconds > 0.0);
    assert!((0.0..=100.0).contains(&route.average_safety_score));
    assert_eq!(route.segments.len(), 1);
    assert!(!route.segments[0].alternatives.is_empty());
    assert_eq!(route.stops.len(), 2);
}

#[tokio::test]
async fn an_exhausted_leg_produces_no_route_at_all() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let base = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 temp path");

    let maps = Arc::new(MapsOrchestrator::new(vec![Arc::new(
        StubRoutingProvider::with_directions_error(
            "down",
            saferoute_core::ProviderError::Unavailable {
                provider: "down".to_owned(),
                message: "connection refused".to_owned(),
            },
        ),
    )]));
    let optimizer = RouteOptimizer::new(maps, chennai_scorer(&base));

    let request = OptimizeRequest {
        start: Stop::new("start", coord(13.0827, 80.2707), "Chennai Central", Priority::Normal)
            .expect("valid stop"),
        stops: vec![
            Stop::new("s1", coord(13.0067, 80.2206), "Guindy", Priority::Normal)
                .expect("valid stop"),
        ],
        objectives: Vec::new(),
        rider: None,
        departure_time: None,
    };

    let result = optimizer.optimize_route(&request).await;
    assert!(result.is_err(), "a route missing a leg must not be returned");
}
