//! Per-leg candidate selection and route assembly.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::{debug, info};
use saferoute_core::{
    Coordinate, LegResult, OptimizedRoute, Recommender, RouteCandidate, ScoredCandidate, Stop,
};
use saferoute_maps::{MapsError, MapsOrchestrator};
use saferoute_scorer::SafetyScorer;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::objective::{Objective, ObjectiveWeights};

/// Rider context carried through an optimization request, used for log
/// attribution only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiderInfo {
    /// Rider identifier.
    pub id: String,
    /// Optional display name.
    #[serde(default)]
    pub name: Option<String>,
}

/// One optimization request, owned end-to-end by the optimizer.
#[derive(Debug, Clone)]
pub struct OptimizeRequest {
    /// Starting point of the route.
    pub start: Stop,
    /// Stops to visit, in caller-supplied order.
    pub stops: Vec<Stop>,
    /// Objectives weighting the candidate selection; empty means an equal
    /// time/safety split.
    pub objectives: Vec<Objective>,
    /// Rider the route is for, when known.
    pub rider: Option<RiderInfo>,
    /// Departure time feeding the lighting term of the safety score.
    pub departure_time: Option<DateTime<Utc>>,
}

/// Errors returned by [`RouteOptimizer::optimize_route`].
#[derive(Debug, Error)]
pub enum OptimizeError {
    /// The request contained no stops to visit.
    #[error("request contains no stops")]
    NoStops,
    /// Every provider was exhausted for one leg. A route missing a leg is
    /// not a deliverable result, so the whole call fails.
    #[error("no route for leg {leg_index} ({from} -> {to})")]
    RoutingFailure {
        /// Zero-based index of the failed leg.
        leg_index: usize,
        /// Identifier of the leg's origin stop.
        from: String,
        /// Identifier of the leg's destination stop.
        to: String,
        /// The orchestrator's exhaustion report.
        #[source]
        source: MapsError,
    },
}

/// Top-level route assembly over the maps orchestrator and safety scorer.
///
/// Legs are processed sequentially so the provider fallback order stays
/// deterministic; independent requests run concurrently with each other.
/// Dropping the returned future cancels the in-flight provider call and
/// starts no further legs; populated geocode and risk caches remain valid.
pub struct RouteOptimizer {
    maps: Arc<MapsOrchestrator>,
    scorer: Arc<SafetyScorer>,
    recommender: Option<Arc<dyn Recommender>>,
}

impl std::fmt::Debug for RouteOptimizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteOptimizer")
            .field("maps", &self.maps)
            .field("recommender", &self.recommender.is_some())
            .finish_non_exhaustive()
    }
}

impl RouteOptimizer {
    /// Build an optimizer over the given collaborators.
    #[must_use]
    pub fn new(maps: Arc<MapsOrchestrator>, scorer: Arc<SafetyScorer>) -> Self {
        Self {
            maps,
            scorer,
            recommender: None,
        }
    }

    /// Attach an external recommendation collaborator.
    #[must_use]
    pub fn with_recommender(mut self, recommender: Arc<dyn Recommender>) -> Self {
        self.recommender = Some(recommender);
        self
    }

    /// Optimize a multi-stop route, visiting stops in caller order.
    ///
    /// # Errors
    /// Returns [`OptimizeError::NoStops`] for an empty stop list and
    /// [`OptimizeError::RoutingFailure`] naming the first leg for which
    /// every provider was exhausted; no partial route is ever returned.
    pub async fn optimize_route(
        &self,
        request: &OptimizeRequest,
    ) -> Result<OptimizedRoute, OptimizeError> {
        if request.stops.is_empty() {
            return Err(OptimizeError::NoStops);
        }
        let weights = ObjectiveWeights::from_objectives(&request.objectives);
        if let Some(rider) = &request.rider {
            debug!("optimizing {} stop(s) for rider {}", request.stops.len(), rider.id);
        }

        let mut waypoints = Vec::with_capacity(request.stops.len() + 1);
        waypoints.push(request.start.clone());
        waypoints.extend(request.stops.iter().cloned());

        let mut segments = Vec::with_capacity(request.stops.len());
        for (leg_index, pair) in waypoints.windows(2).enumerate() {
            let [from, to] = pair else { continue };
            let candidates = self
                .maps
                .get_directions(from.coordinate, to.coordinate, true)
                .await
                .map_err(|source| OptimizeError::RoutingFailure {
                    leg_index,
                    from: from.id.clone(),
                    to: to.id.clone(),
                    source,
                })?;
            let ranked = self.rank_candidates(candidates, weights, from, to, request.departure_time);
            let Some(winner) = ranked.first().cloned() else {
                return Err(OptimizeError::RoutingFailure {
                    leg_index,
                    from: from.id.clone(),
                    to: to.id.clone(),
                    source: MapsError::RoutingUnavailable {
                        attempts: vec!["empty candidate list".to_owned()],
                    },
                });
            };
            let rl_recommended_id = match &self.recommender {
                Some(recommender) => recommender.recommend(leg_index, &ranked).await,
                None => None,
            };
            debug!(
                "leg {leg_index}: selected {} (cost {:.3}) of {} candidate(s)",
                winner.candidate.id,
                winner.combined_cost,
                ranked.len()
            );
            segments.push(LegResult {
                from_stop: from.id.clone(),
                to_stop: to.id.clone(),
                winner,
                alternatives: ranked,
                rl_recommended_id,
            });
        }

        let total_distance_meters: f64 = segments
            .iter()
            .map(|leg| leg.winner.candidate.distance_meters)
            .sum();
        let total_duration_seconds: f64 = segments
            .iter()
            .map(|leg| leg.winner.candidate.duration_seconds)
            .sum();
        let average_safety_score = segments
            .iter()
            .map(|leg| leg.winner.safety.route_safety_score)
            .sum::<f64>()
            / segments.len() as f64;

        let route = OptimizedRoute {
            route_id: Uuid::new_v4().to_string(),
            stops: waypoints,
            segments,
            total_distance_meters,
            total_duration_seconds,
            average_safety_score,
        };
        info!(
            "route {} assembled: {} leg(s), {:.0} m, {:.0} s, safety {:.1}",
            route.route_id,
            route.segments.len(),
            route.total_distance_meters,
            route.total_duration_seconds,
            route.average_safety_score
        );
        Ok(route)
    }

    /// Score and rank one leg's candidates, best first.
    ///
    /// Ties break deterministically: higher safety score, then shorter
    /// distance, then provider order as returned by the orchestrator.
    fn rank_candidates(
        &self,
        candidates: Vec<RouteCandidate>,
        weights: ObjectiveWeights,
        from: &Stop,
        to: &Stop,
        departure_time: Option<DateTime<Utc>>,
    ) -> Vec<ScoredCandidate> {
        let fastest = candidates
            .iter()
            .map(|candidate| candidate.duration_seconds)
            .fold(f64::INFINITY, f64::min);
        let shortest = candidates
            .iter()
            .map(|candidate| candidate.distance_meters)
            .fold(f64::INFINITY, f64::min);

        let mut scored: Vec<(usize, ScoredCandidate)> = candidates
            .into_iter()
            .enumerate()
            .map(|(provider_order, candidate)| {
                let safety = if candidate.path.is_empty() {
                    let endpoints: [Coordinate; 2] = [from.coordinate, to.coordinate];
                    self.scorer.score_route(&endpoints, departure_time)
                } else {
                    self.scorer.score_route(&candidate.path, departure_time)
                };
                let combined_cost = weights.cost(
                    candidate.duration_seconds,
                    candidate.distance_meters,
                    safety.route_safety_score,
                    fastest,
                    shortest,
                );
                (
                    provider_order,
                    ScoredCandidate {
                        candidate,
                        safety,
                        combined_cost,
                    },
                )
            })
            .collect();

        scored.sort_by(|(order_a, a), (order_b, b)| {
            a.combined_cost
                .total_cmp(&b.combined_cost)
                .then_with(|| {
                    b.safety
                        .route_safety_score
                        .total_cmp(&a.safety.route_safety_score)
                })
                .then_with(|| {
                    a.candidate
                        .distance_meters
                        .total_cmp(&b.candidate.distance_meters)
                })
                .then_with(|| order_a.cmp(order_b))
        });
        scored.into_iter().map(|(_, candidate)| candidate).collect()
    }
}
