//! Deterministic test doubles for routing providers.
//!
//! [`StubRoutingProvider`] returns pre-configured responses without touching
//! the network, and counts calls so tests can assert on fallback behaviour.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use saferoute_core::{Coordinate, ProviderError, RouteCandidate, RoutingProvider};

/// Build a plausible straight-line candidate between two points.
///
/// The path is origin, midpoint, destination; enough geometry for route
/// scoring to sample.
#[must_use]
pub fn candidate_between(
    provider: &str,
    index: usize,
    origin: Coordinate,
    destination: Coordinate,
    distance_meters: f64,
    duration_seconds: f64,
) -> RouteCandidate {
    let midpoint = Coordinate::new(
        (origin.latitude() + destination.latitude()) / 2.0,
        (origin.longitude() + destination.longitude()) / 2.0,
    )
    .unwrap_or(origin);
    RouteCandidate {
        id: RouteCandidate::id_for(provider, index),
        provider: provider.to_owned(),
        path: vec![origin, midpoint, destination],
        distance_meters,
        duration_seconds,
        summary: format!("stub route {index}"),
        instructions: Vec::new(),
    }
}

enum StubDirections {
    Candidates(Vec<RouteCandidate>),
    Error(ProviderError),
}

enum StubGeocode {
    Answer(Option<Coordinate>),
    Error(ProviderError),
}

/// Stub [`RoutingProvider`] returning canned responses.
pub struct StubRoutingProvider {
    name: String,
    directions: StubDirections,
    geocode: StubGeocode,
    directions_calls: AtomicUsize,
    geocode_calls: AtomicUsize,
}

impl StubRoutingProvider {
    /// A provider whose directions calls return the given candidates.
    #[must_use]
    pub fn with_candidates(name: &str, candidates: Vec<RouteCandidate>) -> Self {
        Self {
            name: name.to_owned(),
            directions: StubDirections::Candidates(candidates),
            geocode: StubGeocode::Answer(None),
            directions_calls: AtomicUsize::new(0),
            geocode_calls: AtomicUsize::new(0),
        }
    }

    /// A provider whose directions calls return the given error.
    #[must_use]
    pub fn with_directions_error(name: &str, error: ProviderError) -> Self {
        Self {
            name: name.to_owned(),
            directions: StubDirections::Error(error),
            geocode: StubGeocode::Answer(None),
            directions_calls: AtomicUsize::new(0),
            geocode_calls: AtomicUsize::new(0),
        }
    }

    /// A provider whose geocode calls return the given answer.
    #[must_use]
    pub fn with_geocode(name: &str, answer: Option<Coordinate>) -> Self {
        Self {
            name: name.to_owned(),
            directions: StubDirections::Candidates(Vec::new()),
            geocode: StubGeocode::Answer(answer),
            directions_calls: AtomicUsize::new(0),
            geocode_calls: AtomicUsize::new(0),
        }
    }

    /// A provider whose geocode calls return the given error.
    #[must_use]
    pub fn with_geocode_error(name: &str, error: ProviderError) -> Self {
        Self {
            name: name.to_owned(),
            directions: StubDirections::Candidates(Vec::new()),
            geocode: StubGeocode::Error(error),
            directions_calls: AtomicUsize::new(0),
            geocode_calls: AtomicUsize::new(0),
        }
    }

    /// How many directions calls this stub has served.
    #[must_use]
    pub fn directions_calls(&self) -> usize {
        self.directions_calls.load(Ordering::Relaxed)
    }

    /// How many geocode calls this stub has served.
    #[must_use]
    pub fn geocode_calls(&self) -> usize {
        self.geocode_calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl RoutingProvider for StubRoutingProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get_directions(
        &self,
        _origin: Coordinate,
        _destination: Coordinate,
        _want_alternatives: bool,
    ) -> Result<Vec<RouteCandidate>, ProviderError> {
        self.directions_calls.fetch_add(1, Ordering::Relaxed);
        match &self.directions {
            StubDirections::Candidates(candidates) => Ok(candidates.clone()),
            StubDirections::Error(error) => Err(error.clone()),
        }
    }

    async fn geocode(&self, _address: &str) -> Result<Option<Coordinate>, ProviderError> {
        self.geocode_calls.fetch_add(1, Ordering::Relaxed);
        match &self.geocode {
            StubGeocode::Answer(answer) => Ok(*answer),
            StubGeocode::Error(error) => Err(error.clone()),
        }
    }
}
