//! Scored candidates, per-leg results, and the assembled route.

use serde::{Deserialize, Serialize};

use crate::{RouteCandidate, RouteSafety, Stop};

/// A route candidate together with its safety assessment and combined cost.
///
/// Built per leg during optimization and retained in the ranked alternatives
/// list; lower `combined_cost` is better.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredCandidate {
    /// The underlying provider candidate.
    pub candidate: RouteCandidate,
    /// Safety score, risk bucket, and factor breakdown for the path.
    pub safety: RouteSafety,
    /// Scalar multi-objective cost used for ranking.
    pub combined_cost: f64,
}

/// The outcome of one origin-to-destination leg.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegResult {
    /// Identifier of the stop this leg departs from.
    pub from_stop: String,
    /// Identifier of the stop this leg arrives at.
    pub to_stop: String,
    /// The selected candidate.
    pub winner: ScoredCandidate,
    /// Every candidate considered, ranked best-first (the winner is first).
    pub alternatives: Vec<ScoredCandidate>,
    /// Candidate identifier suggested by an external re-ranker, when one is
    /// configured. Recording it never alters the optimizer's own selection.
    pub rl_recommended_id: Option<String>,
}

/// A fully assembled multi-stop route.
///
/// Only produced when every leg succeeded; a route missing a leg is not a
/// deliverable result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizedRoute {
    /// Generated identifier for this optimization result.
    pub route_id: String,
    /// The visited stops in order, starting point first.
    pub stops: Vec<Stop>,
    /// One result per consecutive leg.
    pub segments: Vec<LegResult>,
    /// Sum of the selected candidates' distances.
    pub total_distance_meters: f64,
    /// Sum of the selected candidates' durations.
    pub total_duration_seconds: f64,
    /// Mean of the selected candidates' safety scores.
    pub average_safety_score: f64,
}
